//! # Filer Subcommands

use anyhow::{Context, Result};
use clap::Args;

use weedo_client::WeedClient;

/// Arguments for `weedo ls`.
#[derive(Args, Debug)]
pub struct LsArgs {
    /// Directory to list.
    #[arg(default_value = "/")]
    pub path: String,
    /// Filer address. Defaults to the first of WEED_FILER_URLS.
    #[arg(long, value_name = "ADDRESS")]
    pub filer: Option<String>,
}

/// List a filer directory.
pub async fn run_ls(args: &LsArgs, client: &WeedClient) -> Result<u8> {
    let filer = match &args.filer {
        Some(address) => client.filer(address)?,
        None => client
            .filers()
            .first()
            .cloned()
            .context("no filer configured: pass --filer or set WEED_FILER_URLS")?,
    };
    let dir = filer
        .dir(&args.path)
        .await
        .with_context(|| format!("listing {} failed", args.path))?;
    print!("{dir}");
    Ok(0)
}
