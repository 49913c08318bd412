//! DXFGuard HTTP server.

use std::net::IpAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use dxfguard::DxfGuardConfig;
use dxfguard_server::{router, AppState};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dxfguard-server")]
#[command(about = "HTTP API for DXF drawing analysis", long_about = None)]
#[command(version)]
struct Args {
    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    host: IpAddr,

    /// Port to listen on
    #[arg(short, long, default_value_t = 8000)]
    port: u16,

    /// Directory for uploads and fixed drawings
    #[arg(long, default_value = "uploads")]
    upload_dir: PathBuf,

    /// Configuration file (defaults to ./dxfguard.json when present)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbose logging (debug level)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = DxfGuardConfig::load(args.config.as_deref())?;
    tokio::fs::create_dir_all(&args.upload_dir)
        .await
        .with_context(|| format!("creating {}", args.upload_dir.display()))?;

    let state = AppState::new(&args.upload_dir).with_min_text_height(config.min_text_height);
    let listener = tokio::net::TcpListener::bind((args.host, args.port))
        .await
        .with_context(|| format!("binding {}:{}", args.host, args.port))?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, router(state)).await?;
    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
