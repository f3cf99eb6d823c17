//! Service entry point.

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use faultline::config::{self, ServiceConfig};
use faultline::http::HttpServer;
use faultline::observability::logging;

/// Provenance-aware response logging service.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Path to the TOML config file; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => config::load_config(path)?,
        None => ServiceConfig::default(),
    };

    logging::init(&config.logging);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.server.bind_address,
        format = ?config.logging.format,
        "faultline starting"
    );

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    let server = HttpServer::new(config);
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
