//! Host-rewriting reverse proxy.
//!
//! Forwards every request to one backend while hiding the backend's host
//! name from clients.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request     ┌──────────────────────────────────────────────┐
//!     ───────────────────┼─▶ http::server ─▶ rewrite::request ──────────┼──▶ Backend
//!                        │                  (URI, Host, Referer)        │
//!     Client Response    │                                              │
//!     ◀──────────────────┼── compression ◀─ rewrite::response ◀─────────┼─── Backend
//!                        │                  (Location, Set-Cookie, body)│
//!                        └──────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```bash
//! BACKEND_URL=http://svc-internal:8080 PORT=3000 host-rewrite-proxy
//! host-rewrite-proxy --backend-url http://svc-internal:8080 --config proxy.toml
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use host_rewrite_proxy::config::{load_config, Overrides};
use host_rewrite_proxy::observability::{logging, metrics};
use host_rewrite_proxy::{HttpServer, Shutdown};

/// Transparent reverse proxy that rewrites the backend host identity.
#[derive(Parser, Debug)]
#[command(name = "host-rewrite-proxy")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long, env = "PROXY_CONFIG")]
    config: Option<PathBuf>,

    /// Backend URL to forward to (e.g. http://svc-internal:8080)
    #[arg(short, long, env = "BACKEND_URL")]
    backend_url: Option<String>,

    /// Port to listen on (all interfaces)
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let overrides = Overrides {
        backend_url: args.backend_url.clone(),
        port: args.port,
    };

    // Logging needs the config, so config errors go to stderr.
    let config = match load_config(args.config.as_deref(), &overrides) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    logging::init_logging(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        backend = %config.backend.url,
        compression = config.compression.enabled,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let server = match HttpServer::new(config) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build proxy server");
            std::process::exit(1);
        }
    };

    let bind_address = server.config().listener.bind_address.clone();
    let listener = match TcpListener::bind(&bind_address).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(
                bind_address = %bind_address,
                error = %e,
                "Failed to bind listener"
            );
            std::process::exit(1);
        }
    };

    let shutdown = Shutdown::new();
    if let Err(e) = server.run(listener, shutdown.subscribe()).await {
        tracing::error!(error = %e, "Proxy server error");
        std::process::exit(1);
    }

    tracing::info!("Shutdown complete");
}
