//! Kaltrium site server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ request id / trace / timeout / body limit
//!                              │
//!                              ▼
//!                     ┌──────────────────┐   excluded asset path
//!                     │    edge gate     │──────────────────────────┐
//!                     │ rate limit (429) │                          │
//!                     └────────┬─────────┘                          │
//!                              ▼                                    ▼
//!          ┌───────────────────┬──────────────────┐         static assets,
//!          │ /api/refine       │ pages, sitemap,  │         robots, sitemap
//!          │ /api/create-      │ robots, status   │
//!          │  checkout-session │                  │
//!          └─────────┬─────────┴──────────────────┘
//!                    ▼
//!           refinement / checkout backend
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use kaltrium_web::config::{self, watcher::ConfigWatcher};
use kaltrium_web::lifecycle::{signals, Shutdown};
use kaltrium_web::observability::{logging, metrics};
use kaltrium_web::HttpServer;

#[derive(Parser)]
#[command(name = "kaltrium-web")]
#[command(about = "Edge server for the Kaltrium site", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long, env = "KALTRIUM_CONFIG")]
    config: Option<PathBuf>,

    /// Reload backend and site settings when the config file changes.
    #[arg(long)]
    watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = config::load(cli.config.as_deref())?;
    logging::init_logging(&config.observability)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "kaltrium-web starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        window_ms = config.rate_limit.window_ms,
        max_hits = config.rate_limit.max_hits,
        production = config.security.production,
        maintenance = config.site.maintenance,
        api_url = %config.backend.api_url,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    // Keep the watcher alive for the life of the server.
    let (_watcher, config_updates) = match (&cli.config, cli.watch) {
        (Some(path), true) => {
            let (watcher, updates) = ConfigWatcher::new(path, config.clone());
            (Some(watcher.run()?), updates)
        }
        _ => (None, mpsc::unbounded_channel().1),
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    tokio::spawn(signals::forward_signals(shutdown.clone()));

    let server = HttpServer::new(config)?;
    server.run(listener, config_updates, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
