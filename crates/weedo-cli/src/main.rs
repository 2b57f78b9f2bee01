//! # weedo CLI entry point
//!
//! Parses command-line arguments, builds one client session, and dispatches
//! to the subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use weedo_cli::cluster::{run_grow, run_status, run_vacuum, GrowArgs, StatusArgs, VacuumArgs};
use weedo_cli::filer::{run_ls, LsArgs};
use weedo_cli::object::{
    run_assign, run_delete, run_get, run_locate, run_submit, run_upload, AssignArgs, DeleteArgs,
    GetArgs, LocateArgs, SubmitArgs, UploadArgs,
};

/// Command-line client for a master/volume/filer blob store.
#[derive(Parser, Debug)]
#[command(name = "weedo", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Master address. Defaults to WEED_MASTER_URL, then localhost:9333.
    #[arg(long, global = true, value_name = "ADDRESS")]
    master: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Reserve file id(s) on the master.
    Assign(AssignArgs),

    /// Assign an id and store a local file under it.
    Upload(UploadArgs),

    /// Store a local file in one call to the master or a volume server.
    Submit(SubmitArgs),

    /// Read an object.
    Get(GetArgs),

    /// Delete an object and its replica versions.
    Delete(DeleteArgs),

    /// Show where a volume or object lives.
    Locate(LocateArgs),

    /// Show cluster or volume-server status.
    Status(StatusArgs),

    /// Pre-allocate volumes.
    Grow(GrowArgs),

    /// Compact volumes with too much garbage.
    Vacuum(VacuumArgs),

    /// List a filer directory.
    Ls(LsArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    // Object bodies may go to stdout.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<u8> {
    let client = weedo_cli::connect(cli.master.as_deref())?;

    match &cli.command {
        Commands::Assign(args) => run_assign(args, &client).await,
        Commands::Upload(args) => run_upload(args, &client).await,
        Commands::Submit(args) => run_submit(args, &client).await,
        Commands::Get(args) => run_get(args, &client).await,
        Commands::Delete(args) => run_delete(args, &client).await,
        Commands::Locate(args) => run_locate(args, &client).await,
        Commands::Status(args) => run_status(args, &client).await,
        Commands::Grow(args) => run_grow(args, &client).await,
        Commands::Vacuum(args) => run_vacuum(args, &client).await,
        Commands::Ls(args) => run_ls(args, &client).await,
    }
}
