//! # weedo-client -- Typed Rust client for a master/volume/filer blob store
//!
//! Provides typed access to the three kinds of server in the cluster:
//! - **Master** (directory service): id assignment, volume lookup, admin
//! - **Volume servers**: storing, reading, and deleting objects
//! - **Filers**: path-based listing, upload, and delete
//!
//! ## Architecture
//!
//! A [`WeedClient`] is one client session. It owns a single HTTP client and
//! the volume → location cache; every operation takes the session by
//! reference, and clones share the cache. There is no process-wide default
//! session.
//!
//! Each object operation is one resolve-then-act sequence: resolve the
//! volume (cache, then master), then call the primary location. Nothing in
//! this crate retries; a failed call is reported to the caller as a typed
//! [`WeedError`].

pub mod cache;
pub mod config;
pub mod error;
pub mod filer;
pub mod master;
pub mod resolver;
pub mod transport;
pub mod volume;

pub use cache::LocationCache;
pub use config::WeedConfig;
pub use error::{TransportError, WeedError};
pub use filer::{Directory, FilerClient};
pub use master::{Allocation, AssignRequest, ClusterStatus, GrowRequest, MasterClient, Stored};
pub use resolver::LocationResolver;
pub use transport::Upload;
pub use volume::{BlobStream, DeleteReport, ReplicaDeleteFailure, VolumeClient};
pub use weedo_core::{FileId, Location, VolumeId};

use std::time::Duration;

use bytes::Bytes;

/// Internal and public URLs of an object on one location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUrl {
    pub public_url: String,
    pub url: String,
}

/// A client session.
#[derive(Debug, Clone)]
pub struct WeedClient {
    http: reqwest::Client,
    master: MasterClient,
    resolver: LocationResolver,
    filers: Vec<FilerClient>,
}

impl WeedClient {
    /// Create a session from configuration.
    pub fn new(config: WeedConfig) -> Result<Self, WeedError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(WeedError::ClientInit)?;

        let master = MasterClient::new(http.clone(), config.master_url);
        let cache = LocationCache::new(config.cache_capacity, config.cache_ttl);
        let filers = config
            .filer_urls
            .into_iter()
            .map(|url| FilerClient::new(http.clone(), url))
            .collect();

        Ok(Self {
            resolver: LocationResolver::new(master.clone(), cache),
            master,
            http,
            filers,
        })
    }

    /// Access the master client.
    pub fn master(&self) -> &MasterClient {
        &self.master
    }

    /// Access the location resolver.
    pub fn resolver(&self) -> &LocationResolver {
        &self.resolver
    }

    /// Access the location cache.
    pub fn cache(&self) -> &LocationCache {
        self.resolver.cache()
    }

    /// Configured filers.
    pub fn filers(&self) -> &[FilerClient] {
        &self.filers
    }

    /// The configured filer at `address`, or a new client for it.
    ///
    /// The address may omit its scheme.
    pub fn filer(&self, address: &str) -> Result<FilerClient, WeedError> {
        let url = config::parse_base_url("filer", address)?;
        Ok(self
            .filers
            .iter()
            .find(|f| f.base_url() == &url)
            .cloned()
            .unwrap_or_else(|| FilerClient::new(self.http.clone(), url)))
    }

    // -- Resolution -----------------------------------------------------------

    /// Locations of a volume, primary first.
    pub async fn resolve(
        &self,
        volume_id: VolumeId,
        collection: Option<&str>,
    ) -> Result<Vec<Location>, WeedError> {
        self.resolver.resolve(volume_id, collection).await
    }

    /// Forget a volume's cached locations.
    pub fn invalidate(&self, volume_id: VolumeId) -> bool {
        self.resolver.invalidate(volume_id)
    }

    /// A client bound to the locations of `volume_id`.
    pub async fn volume_for(
        &self,
        volume_id: VolumeId,
        collection: Option<&str>,
    ) -> Result<VolumeClient, WeedError> {
        let locations = self.resolve(volume_id, collection).await?;
        VolumeClient::from_locations(self.http.clone(), locations)
            .ok_or(WeedError::NoLocationAvailable(volume_id))
    }

    /// A client for the volume named by `id`, which is either a bare volume
    /// id (`"3"`) or a file id (`"3,01637037d6"`).
    pub async fn volume(&self, id: &str, collection: Option<&str>) -> Result<VolumeClient, WeedError> {
        let volume_id = match id.parse::<VolumeId>() {
            Ok(volume_id) => volume_id,
            Err(_) => id.parse::<FileId>()?.volume_id(),
        };
        self.volume_for(volume_id, collection).await
    }

    /// A client for a specific volume server, bypassing resolution.
    pub fn volume_at(&self, url: &str, public_url: &str) -> VolumeClient {
        VolumeClient::single(self.http.clone(), Location::new(url, public_url))
    }

    /// URLs of an object on its primary location.
    pub async fn file_url(&self, fid: &FileId, collection: Option<&str>) -> Result<FileUrl, WeedError> {
        let volume = self.volume_for(fid.volume_id(), collection).await?;
        Ok(file_url(volume.primary(), fid))
    }

    /// URLs of an object on every location of its volume, primary first.
    pub async fn file_urls(
        &self,
        fid: &FileId,
        collection: Option<&str>,
    ) -> Result<Vec<FileUrl>, WeedError> {
        let locations = self.resolve(fid.volume_id(), collection).await?;
        Ok(locations.iter().map(|loc| file_url(loc, fid)).collect())
    }

    // -- Allocation and store -------------------------------------------------

    /// Allocate a file id and return the first one granted.
    pub async fn assign(&self, req: &AssignRequest) -> Result<FileId, WeedError> {
        let allocation = self.master.assign(req).await?;
        tracing::info!(fid = %allocation.fid, granted = allocation.count, "assigned file id");
        Ok(allocation.fid)
    }

    /// Allocate a file id, then store `upload` under it on the primary location.
    ///
    /// Not retried: an upload failure after a successful assignment leaves
    /// the id unused.
    pub async fn assign_and_store(
        &self,
        upload: Upload,
        req: &AssignRequest,
    ) -> Result<Stored, WeedError> {
        let fid = self.assign(req).await?;
        let size = self
            .store_version(&fid, 0, upload, req.collection.as_deref())
            .await?;
        tracing::info!(%fid, size, "stored content");
        Ok(Stored { fid, size })
    }

    /// Store `upload` under an existing id, as replica version `version`
    /// when `version > 0`. Returns the bytes written.
    pub async fn store_version(
        &self,
        fid: &FileId,
        version: u32,
        upload: Upload,
        collection: Option<&str>,
    ) -> Result<u64, WeedError> {
        let volume = self.volume_for(fid.volume_id(), collection).await?;
        volume.upload(fid, version, upload).await
    }

    /// Allocate and store in one call to the master's `/submit`.
    pub async fn store_direct(&self, upload: Upload) -> Result<Stored, WeedError> {
        self.master.submit(upload).await
    }

    // -- Delete and read ------------------------------------------------------

    /// Delete an object and its replica versions `_1 .. _(replicas - 1)`.
    ///
    /// See [`VolumeClient::delete`] for the failure policy.
    pub async fn delete(
        &self,
        fid: &FileId,
        replicas: u32,
        collection: Option<&str>,
    ) -> Result<DeleteReport, WeedError> {
        let volume = self.volume_for(fid.volume_id(), collection).await?;
        volume.delete(fid, replicas).await
    }

    /// Read a whole object.
    pub async fn read(&self, fid: &FileId, collection: Option<&str>) -> Result<Bytes, WeedError> {
        let volume = self.volume_for(fid.volume_id(), collection).await?;
        volume.read(fid).await
    }

    /// Start reading an object as a stream of chunks.
    pub async fn open(
        &self,
        fid: &FileId,
        collection: Option<&str>,
    ) -> Result<BlobStream, WeedError> {
        let volume = self.volume_for(fid.volume_id(), collection).await?;
        volume.open(fid).await
    }
}

fn file_url(location: &Location, fid: &FileId) -> FileUrl {
    FileUrl {
        public_url: location.public_file_url(fid, 0),
        url: location.file_url(fid, 0),
    }
}
