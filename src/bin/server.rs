//! # secret2es server
//!
//! Standalone HTTP server binary exposing the conversion endpoint consumed
//! by the browser form, plus metrics and health probes.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use secret2es::constants::DEFAULT_SERVER_PORT;
use secret2es::observability::metrics::register_metrics;
use secret2es::server::{start_server, ServerState};

/// Conversion HTTP server
#[derive(Parser)]
#[command(name = "secret2es-server")]
#[command(about = "HTTP server converting Kubernetes secrets to External Secrets", long_about = None)]
struct Args {
    /// Port to listen on (falls back to the PORT environment variable)
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();
    let port = args.port.unwrap_or_else(|| {
        std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_SERVER_PORT)
    });

    register_metrics().context("Failed to register metrics")?;

    info!(
        "starting secret2es-server {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("BUILD_GIT_HASH")
    );

    let state = Arc::new(ServerState {
        is_ready: Arc::new(AtomicBool::new(false)),
    });

    start_server(port, state).await
}
