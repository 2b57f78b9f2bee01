//! # Object Subcommands
//!
//! Allocation, store, read, delete, and location lookup for single objects.
//! Each command makes one resolve-then-act sequence against the cluster and
//! prints a single line of result to stdout.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;

use weedo_client::{AssignRequest, WeedClient, WeedError};
use weedo_core::{FileId, VolumeId};

/// Placement hints for newly allocated ids.
#[derive(Args, Debug, Default, Clone)]
pub struct Placement {
    /// Collection to allocate in.
    #[arg(long)]
    pub collection: Option<String>,
    /// Replication policy, e.g. "001".
    #[arg(long)]
    pub replication: Option<String>,
    /// Preferred data center.
    #[arg(long)]
    pub data_center: Option<String>,
    /// Time to live, e.g. "3m" or "1d".
    #[arg(long)]
    pub ttl: Option<String>,
}

impl Placement {
    /// An assignment request for `count` ids with these hints.
    pub fn request(&self, count: u32) -> AssignRequest {
        AssignRequest {
            count,
            collection: self.collection.clone(),
            replication: self.replication.clone(),
            data_center: self.data_center.clone(),
            ttl: self.ttl.clone(),
        }
    }
}

/// Arguments for `weedo assign`.
#[derive(Args, Debug)]
pub struct AssignArgs {
    /// Number of ids to reserve. Only the first is printed.
    #[arg(short = 'n', long, default_value_t = 1)]
    pub count: u32,
    #[command(flatten)]
    pub placement: Placement,
}

/// Arguments for `weedo upload`.
#[derive(Args, Debug)]
pub struct UploadArgs {
    /// Local file to store.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
    /// MIME type sent with the content.
    #[arg(long)]
    pub mime: Option<String>,
    #[command(flatten)]
    pub placement: Placement,
}

/// Arguments for `weedo submit`.
#[derive(Args, Debug)]
pub struct SubmitArgs {
    /// Local file to store.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
    /// MIME type sent with the content.
    #[arg(long)]
    pub mime: Option<String>,
    /// Submit to this volume server instead of the master.
    #[arg(long, value_name = "ADDRESS")]
    pub volume: Option<String>,
}

/// Arguments for `weedo get`.
#[derive(Args, Debug)]
pub struct GetArgs {
    /// File id, e.g. "3,01637037d6".
    pub fid: String,
    /// Write to this file instead of stdout.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
    /// Collection hint passed to the master.
    #[arg(long)]
    pub collection: Option<String>,
}

/// Arguments for `weedo delete`.
#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// File id, e.g. "3,01637037d6".
    pub fid: String,
    /// Number of copies stored under the id (primary plus replica versions).
    #[arg(short, long, default_value_t = 1)]
    pub replicas: u32,
    /// Collection hint passed to the master.
    #[arg(long)]
    pub collection: Option<String>,
}

/// Arguments for `weedo locate`.
#[derive(Args, Debug)]
pub struct LocateArgs {
    /// Volume id ("3") or file id ("3,01637037d6").
    pub id: String,
    /// Collection hint passed to the master.
    #[arg(long)]
    pub collection: Option<String>,
}

/// Reserve file id(s) and print the first.
pub async fn run_assign(args: &AssignArgs, client: &WeedClient) -> Result<u8> {
    let fid = client
        .assign(&args.placement.request(args.count))
        .await
        .context("assign failed")?;
    println!("{fid}");
    Ok(0)
}

/// Assign an id and store a local file under it.
pub async fn run_upload(args: &UploadArgs, client: &WeedClient) -> Result<u8> {
    let upload = crate::read_upload(&args.file, args.mime.as_deref())?;
    let stored = client
        .assign_and_store(upload, &args.placement.request(1))
        .await
        .with_context(|| format!("upload of {} failed", args.file.display()))?;
    println!("{}\t{}", stored.fid, stored.size);
    Ok(0)
}

/// Store a local file in one call, letting the server pick the id.
pub async fn run_submit(args: &SubmitArgs, client: &WeedClient) -> Result<u8> {
    let upload = crate::read_upload(&args.file, args.mime.as_deref())?;
    let stored = match &args.volume {
        Some(address) => client.volume_at(address, address).submit(upload).await,
        None => client.store_direct(upload).await,
    }
    .with_context(|| format!("submit of {} failed", args.file.display()))?;
    println!("{}\t{}", stored.fid, stored.size);
    Ok(0)
}

/// Read an object and write it out chunk by chunk.
pub async fn run_get(args: &GetArgs, client: &WeedClient) -> Result<u8> {
    let fid = parse_fid(&args.fid)?;
    let mut stream = match client.open(&fid, args.collection.as_deref()).await {
        Ok(stream) => stream,
        Err(WeedError::NotFound(_)) => {
            eprintln!("NOT FOUND: {fid}");
            return Ok(1);
        }
        Err(e) => return Err(e).context("read failed"),
    };

    let mut sink: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(
            std::fs::File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?,
        ),
        None => Box::new(std::io::stdout()),
    };

    let mut written = 0u64;
    while let Some(chunk) = stream.chunk().await? {
        sink.write_all(&chunk).context("failed to write output")?;
        written += chunk.len() as u64;
    }
    sink.flush().context("failed to write output")?;
    tracing::info!(%fid, written, "read object");
    Ok(0)
}

/// Delete an object and its replica versions.
///
/// Exits with 2 when the primary copy was deleted but some replica
/// version was not.
pub async fn run_delete(args: &DeleteArgs, client: &WeedClient) -> Result<u8> {
    let fid = parse_fid(&args.fid)?;
    let report = client
        .delete(&fid, args.replicas, args.collection.as_deref())
        .await
        .context("delete failed")?;

    for failure in &report.failures {
        eprintln!("FAILED: {} ({})", failure.url, failure.error);
    }
    println!(
        "deleted {fid}: {} of {} copies",
        report.attempted as usize - report.failures.len(),
        report.attempted
    );
    Ok(if report.is_complete() { 0 } else { 2 })
}

/// Print every location of a volume, or every URL of an object.
pub async fn run_locate(args: &LocateArgs, client: &WeedClient) -> Result<u8> {
    let collection = args.collection.as_deref();
    if let Ok(fid) = args.id.parse::<FileId>() {
        for url in client.file_urls(&fid, collection).await? {
            println!("{}\t{}", url.public_url, url.url);
        }
        return Ok(0);
    }

    let Ok(volume_id) = args.id.parse::<VolumeId>() else {
        bail!("not a volume id or file id: {}", args.id);
    };
    for location in client.resolve(volume_id, collection).await? {
        println!("{}\t{}", location.public_url, location.url);
    }
    Ok(0)
}

fn parse_fid(raw: &str) -> Result<FileId> {
    raw.parse::<FileId>()
        .with_context(|| format!("invalid file id: {raw}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placement_builds_request() {
        let placement = Placement {
            collection: Some("pictures".into()),
            ttl: Some("3m".into()),
            ..Placement::default()
        };
        let req = placement.request(4);
        assert_eq!(req.count, 4);
        assert_eq!(req.collection.as_deref(), Some("pictures"));
        assert_eq!(req.ttl.as_deref(), Some("3m"));
        assert!(req.replication.is_none());
    }

    #[test]
    fn parse_fid_reports_input() {
        assert!(parse_fid("3,01637037d6").is_ok());
        let err = parse_fid("3,xyz").unwrap_err();
        assert!(err.to_string().contains("3,xyz"));
    }
}
