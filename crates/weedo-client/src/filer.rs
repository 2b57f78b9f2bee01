//! Typed client for a filer (path-based front over the blob store).
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | GET    | `/{dir}/` | List a directory |
//! | POST   | `/{path}` | Upload a file |
//! | DELETE | `/{path}` | Delete a file or directory |

use std::fmt;

use reqwest::header::ACCEPT;
use serde::Deserialize;
use url::Url;

use crate::error::WeedError;
use crate::transport::{self, endpoint_url, Upload};

/// A file entry in a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FileEntry {
    #[serde(default)]
    pub fid: String,
    #[serde(default)]
    pub name: String,
}

/// A directory listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Directory {
    #[serde(rename = "Directory", default)]
    pub path: String,
    #[serde(rename = "Files", default, deserialize_with = "null_as_empty")]
    pub files: Vec<FileEntry>,
    #[serde(rename = "Subdirectories", default, deserialize_with = "null_as_empty")]
    pub subdirectories: Vec<FileEntry>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<FileEntry>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<FileEntry>>::deserialize(deserializer)?.unwrap_or_default())
}

impl fmt::Display for Directory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.path)?;
        for dir in &self.subdirectories {
            writeln!(f, "  {}/", dir.name)?;
        }
        for file in &self.files {
            writeln!(f, "  {}", file.name)?;
        }
        Ok(())
    }
}

/// Client for one filer.
#[derive(Debug, Clone)]
pub struct FilerClient {
    http: reqwest::Client,
    base_url: Url,
}

impl FilerClient {
    pub(crate) fn new(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// The filer's base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// List a directory. The path is given a leading and trailing `/`.
    ///
    /// The filer renders HTML unless JSON is asked for.
    pub async fn dir(&self, path: &str) -> Result<Directory, WeedError> {
        let path = dir_path(path);
        let endpoint = "GET /{dir}/";
        let url = endpoint_url(&self.base_url, &path);
        tracing::debug!(%url, "listing directory");

        let map_err = |source| WeedError::Filer {
            operation: "list",
            path: path.clone(),
            source,
        };
        let request = self.http.get(&url).header(ACCEPT, "application/json");
        let resp = transport::send(request, endpoint).await.map_err(map_err)?;
        transport::decode_json(resp, endpoint).await.map_err(map_err)
    }

    /// Upload content to a path. The filename sent is the path itself.
    pub async fn upload(
        &self,
        path: &str,
        mime_type: Option<&str>,
        content: Vec<u8>,
    ) -> Result<(), WeedError> {
        let path = file_path(path);
        let endpoint = "POST /{path}";
        let url = endpoint_url(&self.base_url, &path);
        tracing::debug!(%url, size = content.len(), "uploading to filer");

        let mut upload = Upload::new(path.clone(), content);
        upload.mime_type = mime_type.map(str::to_string);
        let form = upload.into_form()?;

        let map_err = |source| WeedError::Filer {
            operation: "upload",
            path: path.clone(),
            source,
        };
        let resp = transport::send(self.http.post(&url).multipart(form), endpoint)
            .await
            .map_err(map_err)?;
        transport::checked_body(resp, endpoint)
            .await
            .map_err(map_err)?;
        Ok(())
    }

    /// Delete a file, or a directory when the path ends in `/`.
    pub async fn delete(&self, path: &str) -> Result<(), WeedError> {
        let path = file_path(path);
        let endpoint = "DELETE /{path}";
        let url = endpoint_url(&self.base_url, &path);
        tracing::debug!(%url, "deleting from filer");

        let map_err = |source| WeedError::Filer {
            operation: "delete",
            path: path.clone(),
            source,
        };
        let resp = transport::send(self.http.delete(&url), endpoint)
            .await
            .map_err(map_err)?;
        transport::checked_body(resp, endpoint)
            .await
            .map_err(map_err)?;
        Ok(())
    }
}

fn file_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

fn dir_path(path: &str) -> String {
    let mut path = file_path(path);
    if !path.ends_with('/') {
        path.push('/');
    }
    path
}
