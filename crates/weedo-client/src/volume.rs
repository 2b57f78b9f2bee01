//! Typed client for volume servers.
//!
//! A [`VolumeClient`] is bound to the locations of one volume (primary
//! first). Object calls go to the primary's public address.
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | POST   | `/{fid}[_{version}]` | Store content |
//! | GET    | `/{fid}[_{version}]` | Read content |
//! | DELETE | `/{fid}[_{version}]` | Delete content |
//! | POST   | `/submit` | Store without pre-assignment |
//! | GET    | `/status` | Server health and volumes |
//! | GET    | `/admin/assign_volume` | Create a volume on this server |

use bytes::Bytes;
use reqwest::StatusCode;
use serde::Deserialize;
use weedo_core::{FileId, Location, VolumeId};

use crate::error::{TransportError, WeedError};
use crate::master::{submit_to, Stored};
use crate::transport::{self, Upload, UploadReply};

// -- Delete report ------------------------------------------------------------

/// A replica version that could not be confirmed deleted.
#[derive(Debug)]
pub struct ReplicaDeleteFailure {
    pub version: u32,
    pub url: String,
    pub error: TransportError,
}

/// Outcome of a delete whose primary copy was removed.
///
/// Secondary replica versions are deleted best-effort: each failure is
/// recorded here rather than aborting the remaining deletions.
#[derive(Debug)]
pub struct DeleteReport {
    pub fid: FileId,
    /// Number of delete calls issued, primary included.
    pub attempted: u32,
    pub failures: Vec<ReplicaDeleteFailure>,
}

impl DeleteReport {
    /// Whether every replica version was confirmed deleted.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Versions that were not confirmed deleted.
    pub fn failed_versions(&self) -> Vec<u32> {
        self.failures.iter().map(|f| f.version).collect()
    }
}

// -- Status -------------------------------------------------------------------

/// Volume-server status from `/status`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct VolumeServerStatus {
    pub version: String,
    pub volumes: Vec<VolumeInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct VolumeInfo {
    pub id: u32,
    pub size: u64,
    pub collection: String,
    pub file_count: u64,
    pub delete_count: u64,
    pub deleted_byte_count: u64,
    pub read_only: bool,
    pub version: u32,
}

// -- Streaming read -----------------------------------------------------------

/// Body of an object being read, yielded chunk by chunk.
#[derive(Debug)]
pub struct BlobStream {
    url: String,
    response: reqwest::Response,
}

impl BlobStream {
    /// Declared body length, when the server sent one.
    pub fn content_length(&self) -> Option<u64> {
        self.response.content_length()
    }

    /// Next chunk of the body, or `None` at the end.
    pub async fn chunk(&mut self) -> Result<Option<Bytes>, WeedError> {
        self.response.chunk().await.map_err(|e| WeedError::Read {
            url: self.url.clone(),
            source: TransportError::Http {
                endpoint: self.url.clone(),
                source: e,
            },
        })
    }
}

// -- Client -------------------------------------------------------------------

/// Client for the volume servers holding one volume.
#[derive(Debug, Clone)]
pub struct VolumeClient {
    http: reqwest::Client,
    primary: Location,
    replicas: Vec<Location>,
}

impl VolumeClient {
    /// Bind to a non-empty list of locations. Returns `None` for an empty list.
    pub(crate) fn from_locations(http: reqwest::Client, locations: Vec<Location>) -> Option<Self> {
        let mut iter = locations.into_iter();
        let primary = iter.next()?;
        Some(Self {
            http,
            primary,
            replicas: iter.collect(),
        })
    }

    /// Bind to a single location.
    pub(crate) fn single(http: reqwest::Client, location: Location) -> Self {
        Self {
            http,
            primary: location,
            replicas: Vec::new(),
        }
    }

    /// The preferred location.
    pub fn primary(&self) -> &Location {
        &self.primary
    }

    /// Every location, primary first.
    pub fn locations(&self) -> impl Iterator<Item = &Location> {
        std::iter::once(&self.primary).chain(self.replicas.iter())
    }

    /// Internal URL of the primary location.
    pub fn url(&self) -> &str {
        &self.primary.url
    }

    /// Public URL of the primary location.
    pub fn public_url(&self) -> &str {
        &self.primary.public_url
    }

    /// Store content under `fid`, or under replica version `{fid}_{version}`
    /// when `version > 0`.
    ///
    /// Returns the number of bytes the server reports as written. Not retried.
    pub async fn upload(&self, fid: &FileId, version: u32, upload: Upload) -> Result<u64, WeedError> {
        let endpoint = format!("POST /{}", fid.versioned(version));
        let url = self.primary.public_file_url(fid, version);
        let content_len = upload.len();
        tracing::debug!(%url, filename = %upload.filename, size = content_len, "uploading content");

        let form = upload.into_form()?;
        let map_err = |source| WeedError::Upload {
            url: url.clone(),
            source,
        };
        let resp = transport::send(self.http.post(&url).multipart(form), &endpoint)
            .await
            .map_err(map_err)?;
        let reply: UploadReply = transport::decode_json(resp, &endpoint)
            .await
            .map_err(map_err)?;

        Ok(reply.size.unwrap_or(content_len))
    }

    /// Store content and let the volume server pick the id.
    ///
    /// Calls `POST {public_url}/submit`.
    pub async fn submit(&self, upload: Upload) -> Result<Stored, WeedError> {
        let url = format!("{}/submit", self.primary.public_url);
        submit_to(&self.http, url, upload).await
    }

    /// Delete `fid` and replica versions `_1 .. _(replicas - 1)`.
    ///
    /// `replicas` of zero is treated as one. Failing to delete the primary
    /// copy is an error and nothing else is attempted; failures on replica
    /// versions are collected in the report. A replica version the server
    /// answers 404 for was never stored and counts as deleted.
    pub async fn delete(&self, fid: &FileId, replicas: u32) -> Result<DeleteReport, WeedError> {
        let replicas = replicas.max(1);

        let url = self.primary.public_file_url(fid, 0);
        if let Err(source) = self.delete_version(fid, 0).await {
            return Err(WeedError::Delete { url, source });
        }

        let mut failures = Vec::new();
        for version in 1..replicas {
            let url = self.primary.public_file_url(fid, version);
            match self.delete_version(fid, version).await {
                Ok(()) => {}
                Err(TransportError::Status { status: 404, .. }) => {
                    tracing::debug!(%url, "replica version absent");
                }
                Err(error) => {
                    tracing::warn!(%url, %error, "failed to delete replica version");
                    failures.push(ReplicaDeleteFailure {
                        version,
                        url,
                        error,
                    });
                }
            }
        }

        tracing::info!(%fid, attempted = replicas, failed = failures.len(), "deleted file");
        Ok(DeleteReport {
            fid: *fid,
            attempted: replicas,
            failures,
        })
    }

    async fn delete_version(&self, fid: &FileId, version: u32) -> Result<(), TransportError> {
        let endpoint = format!("DELETE /{}", fid.versioned(version));
        let url = self.primary.public_file_url(fid, version);
        tracing::debug!(%url, "deleting");
        let resp = transport::send(self.http.delete(&url), &endpoint).await?;
        transport::checked_body(resp, &endpoint).await?;
        Ok(())
    }

    /// Read the whole object.
    ///
    /// A 404 or an empty body is [`WeedError::NotFound`].
    pub async fn read(&self, fid: &FileId) -> Result<Bytes, WeedError> {
        let BlobStream { url, response } = self.open(fid).await?;
        let body = response.bytes().await.map_err(|e| WeedError::Read {
            url: url.clone(),
            source: TransportError::Http {
                endpoint: url,
                source: e,
            },
        })?;
        if body.is_empty() {
            return Err(WeedError::NotFound(*fid));
        }
        Ok(body)
    }

    /// Start reading an object, yielding its body as a stream of chunks.
    ///
    /// A 404 or a declared zero length is [`WeedError::NotFound`].
    pub async fn open(&self, fid: &FileId) -> Result<BlobStream, WeedError> {
        let endpoint = format!("GET /{fid}");
        let url = self.primary.public_file_url(fid, 0);
        tracing::debug!(%url, "reading");

        let response = transport::send(self.http.get(&url), &endpoint)
            .await
            .map_err(|source| WeedError::Read {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(WeedError::NotFound(*fid));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WeedError::Read {
                source: TransportError::Status {
                    endpoint,
                    status: status.as_u16(),
                    body,
                },
                url,
            });
        }
        if response.content_length() == Some(0) {
            return Err(WeedError::NotFound(*fid));
        }

        Ok(BlobStream { url, response })
    }

    /// Fetch the primary server's status.
    ///
    /// Calls `GET {public_url}/status`.
    pub async fn status(&self) -> Result<VolumeServerStatus, WeedError> {
        let endpoint = "GET /status";
        let url = format!("{}/status", self.primary.public_url);
        let map_err = |source| WeedError::Admin {
            operation: "volume server status",
            source,
        };
        let resp = transport::send(self.http.get(&url), endpoint)
            .await
            .map_err(map_err)?;
        transport::decode_json(resp, endpoint).await.map_err(map_err)
    }

    /// Ask the primary server to create a volume.
    ///
    /// Calls `GET {public_url}/admin/assign_volume`.
    pub async fn assign_volume(
        &self,
        volume_id: VolumeId,
        replication: Option<&str>,
    ) -> Result<(), WeedError> {
        let endpoint = "GET /admin/assign_volume";
        let url = format!("{}/admin/assign_volume", self.primary.public_url);
        let mut query = vec![("volume", volume_id.to_string())];
        if let Some(r) = replication.filter(|r| !r.is_empty()) {
            query.push(("replication", r.to_string()));
        }
        let map_err = |source| WeedError::Admin {
            operation: "assign volume",
            source,
        };
        let resp = transport::send(self.http.get(&url).query(&query), endpoint)
            .await
            .map_err(map_err)?;
        transport::checked_body(resp, endpoint)
            .await
            .map_err(map_err)?;
        Ok(())
    }
}
