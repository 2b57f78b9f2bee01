//! Thin request/response helpers shared by the master, volume, and filer clients.
//!
//! Every JSON payload from the cluster has an `error` field. An empty or
//! absent value means success; anything else fails the whole call with that
//! message, whatever the HTTP status. Non-2xx responses without such a
//! message fail with the status and body.

use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use crate::error::{TransportError, WeedError};

const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Content to be stored, with the filename and MIME type sent alongside it.
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub mime_type: Option<String>,
    pub content: Vec<u8>,
}

impl Upload {
    /// Content with a filename and the default MIME type.
    pub fn new(filename: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            mime_type: None,
            content: content.into(),
        }
    }

    /// Set the MIME type sent with the content.
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Size of the content in bytes.
    pub fn len(&self) -> u64 {
        self.content.len() as u64
    }

    /// Whether the content is empty.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Encode as a multipart form with a single `file` part.
    pub(crate) fn into_form(self) -> Result<Form, WeedError> {
        let mime = self
            .mime_type
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string());
        let part = Part::bytes(self.content)
            .file_name(self.filename)
            .mime_str(&mime)
            .map_err(|_| WeedError::InvalidMimeType(mime.clone()))?;
        Ok(Form::new().part("file", part))
    }
}

/// Reply to a store or submit call.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UploadReply {
    #[serde(default, alias = "Fid")]
    pub fid: Option<String>,
    #[serde(default, alias = "Size")]
    pub size: Option<u64>,
}

/// The error channel present on every JSON payload.
#[derive(Debug, Default, Deserialize)]
struct ErrorReply {
    #[serde(default, alias = "Error")]
    error: Option<String>,
}

/// Join a path onto a base URL, ignoring any trailing slash on the base.
pub(crate) fn endpoint_url(base: &Url, path: &str) -> String {
    format!(
        "{}/{}",
        base.as_str().trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Send a request, mapping transport failures.
pub(crate) async fn send(
    request: reqwest::RequestBuilder,
    endpoint: &str,
) -> Result<reqwest::Response, TransportError> {
    request.send().await.map_err(|e| TransportError::Http {
        endpoint: endpoint.to_string(),
        source: e,
    })
}

/// Read the whole body and check the status and the `error` channel.
///
/// Returns the raw body on success. An empty body is a success when the
/// status is 2xx.
pub(crate) async fn checked_body(
    resp: reqwest::Response,
    endpoint: &str,
) -> Result<Bytes, TransportError> {
    let status = resp.status();
    let body = resp.bytes().await.map_err(|e| TransportError::Http {
        endpoint: endpoint.to_string(),
        source: e,
    })?;

    if let Ok(ErrorReply { error: Some(message) }) = serde_json::from_slice::<ErrorReply>(&body) {
        if !message.is_empty() {
            return Err(TransportError::Server {
                endpoint: endpoint.to_string(),
                message,
            });
        }
    }

    if !status.is_success() {
        return Err(TransportError::Status {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
            body: String::from_utf8_lossy(&body).into_owned(),
        });
    }

    Ok(body)
}

/// Check the response and decode its JSON body.
pub(crate) async fn decode_json<T: DeserializeOwned>(
    resp: reqwest::Response,
    endpoint: &str,
) -> Result<T, TransportError> {
    let body = checked_body(resp, endpoint).await?;
    serde_json::from_slice(&body).map_err(|e| TransportError::Deserialization {
        endpoint: endpoint.to_string(),
        source: e,
    })
}
