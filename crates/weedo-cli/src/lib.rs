//! # weedo-cli -- command-line access to the blob store
//!
//! Provides the `weedo` binary on top of [`weedo_client`].
//!
//! ## Subcommands
//!
//! - `weedo assign` -- reserve file id(s) and print the first.
//! - `weedo upload` / `weedo submit` -- store a local file.
//! - `weedo get` -- read an object to stdout or a file.
//! - `weedo delete` -- delete an object and its replica versions.
//! - `weedo locate` -- print the locations of a volume or object.
//! - `weedo status` / `weedo grow` / `weedo vacuum` -- cluster administration.
//! - `weedo ls` -- list a filer directory.
//!
//! The master address comes from `--master`, then `WEED_MASTER_URL`:
//!
//! ```bash
//! weedo --master localhost:9333 upload ./photo.jpg --collection pictures
//! weedo get 3,01637037d6 -o photo.jpg
//! weedo delete 3,01637037d6 --replicas 2
//! ```

pub mod cluster;
pub mod filer;
pub mod object;

use std::path::Path;

use anyhow::{Context, Result};
use weedo_client::{Upload, WeedClient, WeedConfig};

/// Build a client session from the environment, optionally overriding the master.
pub fn connect(master: Option<&str>) -> Result<WeedClient> {
    let mut config = WeedConfig::from_env().context("invalid WEED_* environment")?;
    if let Some(master) = master {
        config = config
            .with_master(master)
            .with_context(|| format!("invalid master address: {master}"))?;
    }
    tracing::debug!(master = %config.master_url, filers = config.filer_urls.len(), "connecting");
    WeedClient::new(config).context("failed to build HTTP client")
}

/// Read a local file into an upload named after its last path component.
pub fn read_upload(path: &Path, mime_type: Option<&str>) -> Result<Upload> {
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .with_context(|| format!("not a file path: {}", path.display()))?;
    let content =
        std::fs::read(path).with_context(|| format!("failed to read file: {}", path.display()))?;

    let upload = Upload::new(filename, content);
    Ok(match mime_type {
        Some(mime) => upload.with_mime_type(mime),
        None => upload,
    })
}
