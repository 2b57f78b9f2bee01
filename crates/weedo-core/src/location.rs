//! # Storage-Node Locations
//!
//! The directory service reports storage nodes as bare `host:port` pairs.
//! [`Location`] normalizes both of its addresses to carry an explicit
//! scheme before anything builds an outbound URL from them.

use serde::{Deserialize, Serialize};

use crate::fid::FileId;

/// Network address of a storage node holding a volume replica.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawLocation")]
pub struct Location {
    /// Cluster-internal address, e.g. `http://10.0.0.1:8080`.
    pub url: String,
    /// Externally reachable address, e.g. `http://pub.example.com:8080`.
    #[serde(rename = "publicUrl")]
    pub public_url: String,
}

impl Location {
    /// Build a location, normalizing both addresses.
    ///
    /// An empty public address falls back to the internal one; some
    /// deployments only advertise a single address per node.
    pub fn new(url: impl AsRef<str>, public_url: impl AsRef<str>) -> Self {
        let url = normalize_address(url.as_ref());
        let public_url = match public_url.as_ref().trim() {
            "" => url.clone(),
            public => normalize_address(public),
        };
        Self { url, public_url }
    }

    /// Internal URL of an object (or one of its replica versions) on this node.
    pub fn file_url(&self, fid: &FileId, version: u32) -> String {
        format!("{}/{}", self.url, fid.versioned(version))
    }

    /// Public URL of an object (or one of its replica versions) on this node.
    pub fn public_file_url(&self, fid: &FileId, version: u32) -> String {
        format!("{}/{}", self.public_url, fid.versioned(version))
    }
}

/// Wire shape of a location as reported by the directory service.
///
/// The service emits `url`/`publicUrl`; older tooling capitalizes them.
#[derive(Deserialize)]
struct RawLocation {
    #[serde(alias = "Url", default)]
    url: String,
    #[serde(rename = "publicUrl", alias = "PublicUrl", default)]
    public_url: String,
}

impl From<RawLocation> for Location {
    fn from(raw: RawLocation) -> Self {
        Self::new(raw.url, raw.public_url)
    }
}

/// Prefix `http://` onto an address that lacks a scheme and drop trailing slashes.
pub fn normalize_address(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    }
}
