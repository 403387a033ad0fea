use std::path::PathBuf;

use clap::Parser;
use nanoserve::config::Config;
use nanoserve::files::FileServer;
use nanoserve::server::Server;
use tracing_subscriber::EnvFilter;

/// Serve a directory over HTTP/1.0.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// YAML config file (overrides NANOSERVE_CONFIG)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Interface to bind, all interfaces when omitted
    #[arg(long)]
    host: Option<String>,

    #[arg(short, long)]
    port: Option<u16>,

    /// Document root
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Answer 403 instead of listing directories without an index file
    #[arg(long)]
    no_listing: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_level(true)
        .init();

    let args = Args::parse();

    let mut cfg = match &args.config {
        Some(path) => {
            let mut cfg = Config::from_file(path)?;
            cfg.apply_env()?;
            cfg
        }
        None => Config::load()?,
    };
    if args.host.is_some() {
        cfg.server.host = args.host;
    }
    if let Some(port) = args.port {
        cfg.server.port = port;
    }
    if let Some(root) = args.root {
        cfg.static_files.root = root;
    }
    if args.no_listing {
        cfg.static_files.listing = false;
    }

    tracing::info!(
        root = %cfg.static_files.root.display(),
        listing = cfg.static_files.listing,
        "Serving files"
    );

    let handler = FileServer::new(cfg.file_server());
    let server = Server::from_config(&cfg, handler).start().await?;

    tokio::select! {
        _ = server.join() => {}

        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}
