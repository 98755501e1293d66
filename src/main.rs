//! Command router (v1)
//!
//! Serves HTTP requests by running external commands chosen from a route
//! table that can be edited while the server runs.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request        ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//!     ─────────────────────▶│ user :8080   │───▶│  dispatcher  │───▶│ route table  │
//!                           └──────────────┘    └──────┬───────┘    └──────▲───────┘
//!                                                      │                   │
//!                                                      ▼                   │
//!                                               ┌──────────────┐    ┌──────┴───────┐
//!                                               │ command      │    │ control :8081│◀── routectl
//!                                               │ (entrypoint) │    │ (admin API)  │
//!                                               └──────┬───────┘    └──────────────┘
//!                                                      │ CMDROUTER_HANDLER_ID
//!                                                      ▼
//!                                               ┌──────────────┐
//!                                               │ data :8082   │
//!                                               │ (handler API)│
//!                                               └──────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use command_router::config::{load_config, ServerConfig};
use command_router::observability::{logging, metrics};
use command_router::{lifecycle, HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "command-router")]
#[command(about = "HTTP server that answers requests by running commands", long_about = None)]
struct Cli {
    /// TOML configuration file; built-in defaults when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };

    logging::init_logging(&config.observability)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = ?cli.config,
        seed_routes = config.routes.len(),
        timeout_secs = config.execution.timeout_secs,
        "command-router starting"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let server = HttpServer::bind(config).await?;

    let shutdown = Shutdown::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        lifecycle::wait_for_signal().await;
        trigger.trigger();
    });

    server.run(shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
