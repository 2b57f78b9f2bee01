//! Volume location resolution: cache first, master on a miss.

use std::sync::Arc;

use weedo_core::{Location, VolumeId};

use crate::cache::LocationCache;
use crate::error::WeedError;
use crate::master::MasterClient;

/// Resolves volumes to locations, remembering the answers.
///
/// Clones share the same cache.
#[derive(Debug, Clone)]
pub struct LocationResolver {
    master: MasterClient,
    cache: Arc<LocationCache>,
}

impl LocationResolver {
    pub(crate) fn new(master: MasterClient, cache: LocationCache) -> Self {
        Self {
            master,
            cache: Arc::new(cache),
        }
    }

    /// The shared cache.
    pub fn cache(&self) -> &LocationCache {
        &self.cache
    }

    /// Locations of a volume, primary first.
    ///
    /// A cached answer is returned without contacting the master. On a miss
    /// the master is asked, and a non-empty answer is cached. Two concurrent
    /// misses for the same volume may both reach the master; the later
    /// answer wins the cache slot.
    pub async fn resolve(
        &self,
        volume_id: VolumeId,
        collection: Option<&str>,
    ) -> Result<Vec<Location>, WeedError> {
        if let Some(locations) = self.cache.get(volume_id) {
            tracing::trace!(%volume_id, "location cache hit");
            return Ok(locations);
        }

        let locations = self.master.lookup(volume_id, collection).await?;
        if locations.is_empty() {
            return Err(WeedError::NoLocationAvailable(volume_id));
        }

        tracing::debug!(%volume_id, count = locations.len(), "caching volume locations");
        self.cache.put(volume_id, locations.clone());
        Ok(locations)
    }

    /// Forget a volume's locations so the next resolution asks the master.
    pub fn invalidate(&self, volume_id: VolumeId) -> bool {
        self.cache.invalidate(volume_id)
    }
}
