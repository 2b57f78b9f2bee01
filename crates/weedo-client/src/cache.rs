//! Volume → location cache.
//!
//! Every read, write, and delete starts by resolving a volume, so the cache
//! keeps the master off the hot path. Entries are bounded two ways: an LRU
//! capacity, and an optional maximum age after which an entry counts as
//! absent. [`LocationCache::invalidate`] drops an entry when a caller learns
//! that a volume moved.
//!
//! The lock is `parking_lot` and is never held across an `.await`.

use std::fmt;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;
use weedo_core::{Location, VolumeId};

struct CacheEntry {
    locations: Vec<Location>,
    inserted_at: Instant,
}

/// Thread-safe, bounded map from volume id to its replica locations.
pub struct LocationCache {
    entries: Mutex<LruCache<VolumeId, CacheEntry>>,
    ttl: Option<Duration>,
}

impl LocationCache {
    /// Create a cache holding at most `capacity` volumes.
    pub fn new(capacity: NonZeroUsize, ttl: Option<Duration>) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    /// Cached locations for a volume, primary first.
    ///
    /// Returns `None` when the volume was never cached, was evicted, or its
    /// entry is older than the configured TTL (the stale entry is dropped).
    pub fn get(&self, volume_id: VolumeId) -> Option<Vec<Location>> {
        let mut entries = self.entries.lock();
        let expired = match entries.get(&volume_id) {
            None => return None,
            Some(entry) => self
                .ttl
                .is_some_and(|ttl| entry.inserted_at.elapsed() >= ttl),
        };
        if expired {
            entries.pop(&volume_id);
            return None;
        }
        entries.get(&volume_id).map(|entry| entry.locations.clone())
    }

    /// Insert or replace the locations for a volume. Last writer wins.
    ///
    /// An empty sequence removes the entry instead: cached entries are never empty.
    pub fn put(&self, volume_id: VolumeId, locations: Vec<Location>) {
        let mut entries = self.entries.lock();
        if locations.is_empty() {
            entries.pop(&volume_id);
            return;
        }
        entries.put(
            volume_id,
            CacheEntry {
                locations,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Drop the entry for a volume. Returns whether one was present.
    pub fn invalidate(&self, volume_id: VolumeId) -> bool {
        self.entries.lock().pop(&volume_id).is_some()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Number of cached volumes, including any not yet noticed as expired.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of cached volumes.
    pub fn capacity(&self) -> NonZeroUsize {
        self.entries.lock().cap()
    }
}

impl fmt::Debug for LocationCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.entries.lock();
        f.debug_struct("LocationCache")
            .field("len", &entries.len())
            .field("capacity", &entries.cap())
            .field("ttl", &self.ttl)
            .finish()
    }
}
