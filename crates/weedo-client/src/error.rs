//! Client error types.
//!
//! Two layers: [`TransportError`] describes what went wrong in a single
//! HTTP exchange, and [`WeedError`] says which operation it broke. Callers
//! match on the operation and, when they care, inspect the transport cause
//! (for example to tell a server-reported message from a refused connection).

use weedo_core::{FileId, ValidationError, VolumeId};

use crate::config::ConfigError;

/// Failure of one request/response exchange with a master, volume server, or filer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Connection, timeout, or other transport failure.
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        endpoint: String,
        source: reqwest::Error,
    },
    /// Non-2xx status without a server-reported error message.
    #[error("{endpoint} returned {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },
    /// The body was not the expected JSON shape.
    #[error("failed to deserialize response from {endpoint}: {source}")]
    Deserialization {
        endpoint: String,
        source: serde_json::Error,
    },
    /// The JSON `error` field was non-empty.
    #[error("{endpoint} reported: {message}")]
    Server { endpoint: String, message: String },
}

impl TransportError {
    /// The message from the response's `error` field, if that is what failed.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Server { message, .. } => Some(message),
            _ => None,
        }
    }

    /// The HTTP status, if the failure carried one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http { source, .. } => source.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Errors from client operations.
#[derive(Debug, thiserror::Error)]
pub enum WeedError {
    /// The input is not a valid file or volume identifier.
    #[error("malformed identifier: {0}")]
    MalformedIdentifier(#[from] ValidationError),

    /// The master could not assign a file id.
    #[error("assign failed: {0}")]
    Assign(#[source] TransportError),

    /// The master could not resolve a volume.
    #[error("lookup of volume {volume_id} failed: {source}")]
    Lookup {
        volume_id: VolumeId,
        source: TransportError,
    },

    /// The master resolved a volume to zero locations.
    #[error("no location available for volume {0}")]
    NoLocationAvailable(VolumeId),

    /// Storing content on a volume server failed.
    #[error("upload to {url} failed: {source}")]
    Upload { url: String, source: TransportError },

    /// A combined assign+store submission failed.
    #[error("submit to {url} failed: {source}")]
    Submit { url: String, source: TransportError },

    /// Deleting the primary copy of an object failed.
    #[error("delete of {url} failed: {source}")]
    Delete { url: String, source: TransportError },

    /// Reading an object failed for a reason other than absence.
    #[error("read of {url} failed: {source}")]
    Read { url: String, source: TransportError },

    /// The object does not exist or is empty.
    #[error("file {0} not found")]
    NotFound(FileId),

    /// A master or volume-server administrative call failed.
    #[error("{operation} failed: {source}")]
    Admin {
        operation: &'static str,
        source: TransportError,
    },

    /// A filer call failed.
    #[error("filer {operation} of {path} failed: {source}")]
    Filer {
        operation: &'static str,
        path: String,
        source: TransportError,
    },

    /// The MIME type given for an upload does not parse.
    #[error("invalid MIME type \"{0}\"")]
    InvalidMimeType(String),

    /// Building the HTTP client failed.
    #[error("failed to build HTTP client: {0}")]
    ClientInit(#[source] reqwest::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl WeedError {
    /// Whether repeating the same call could succeed.
    ///
    /// Bad input, missing objects, and configuration problems fail the same
    /// way every time. Everything else depends on server or network state.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            Self::MalformedIdentifier(_)
                | Self::NotFound(_)
                | Self::InvalidMimeType(_)
                | Self::ClientInit(_)
                | Self::Config(_)
        )
    }

    /// The transport failure behind this error, if any.
    pub fn transport(&self) -> Option<&TransportError> {
        match self {
            Self::Assign(source)
            | Self::Lookup { source, .. }
            | Self::Upload { source, .. }
            | Self::Submit { source, .. }
            | Self::Delete { source, .. }
            | Self::Read { source, .. }
            | Self::Admin { source, .. }
            | Self::Filer { source, .. } => Some(source),
            _ => None,
        }
    }
}
