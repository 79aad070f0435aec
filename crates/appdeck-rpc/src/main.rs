//! Appdeck RPC Server - JSON-RPC backend for the launcher frontend.
//!
//! This binary provides a JSON-RPC 2.0 server that wraps the appdeck-core
//! icon pipeline for communication with the desktop frontend process.

mod handlers;
mod server;
mod wrapper;

use anyhow::{Context, Result};
use appdeck_core::config::PathsConfig;
use appdeck_core::IconService;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "appdeck-rpc")]
#[command(about = "JSON-RPC server for the Appdeck icon pipeline")]
struct Args {
    /// Port to listen on (0 = auto-assign)
    #[arg(short, long, default_value = "0")]
    port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Icon store directory (defaults to <data dir>/appdeck/icons)
    #[arg(long)]
    icon_dir: Option<PathBuf>,

    /// Skip third-party favicon lookup services
    #[arg(long)]
    no_external_services: bool,

    /// Per-candidate fetch timeout in seconds
    #[arg(long, default_value = "10")]
    fetch_timeout_secs: u64,

    /// Maximum candidate fetches in flight
    #[arg(long, default_value = "4")]
    concurrency: usize,
}

fn default_icon_dir() -> Result<PathBuf> {
    if let Some(data_dir) = dirs::data_dir() {
        return Ok(data_dir.join("appdeck").join(PathsConfig::ICONS_DIR_NAME));
    }
    let cwd = std::env::current_dir().context("no data directory and no working directory")?;
    Ok(cwd.join(PathsConfig::ICONS_DIR_NAME))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    info!("Starting Appdeck RPC Server");

    let icon_dir = match args.icon_dir {
        Some(path) => path,
        None => default_icon_dir()?,
    };
    info!("Icon directory: {}", icon_dir.display());

    let service = IconService::builder(&icon_dir)
        .auto_create_dirs(true)
        .external_services(!args.no_external_services)
        .candidate_timeout(Duration::from_secs(args.fetch_timeout_secs))
        .concurrency(args.concurrency)
        .build()
        .await
        .context("failed to initialize icon service")?;

    // Start the server
    let addr = server::start_server(service, &args.host, args.port).await?;

    // Print port for the frontend to read (intentional stdout for IPC)
    println!("RPC_PORT={}", addr.port());

    info!("RPC server running on {}", addr);

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received, exiting");

    Ok(())
}
