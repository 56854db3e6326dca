//! Glucolink Service - LibreLinkUp collector and HTTP API.
//!
//! Run with: `cargo run -p glucolink-service`

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use glucolink_core::LinkUpClient;
use glucolink_service::{AppState, Collector, Config, api, state};
use glucolink_store::{MemoryStore, SharedStore};

/// Glucolink Service - LibreLinkUp collector and HTTP API.
#[derive(Parser, Debug)]
#[command(name = "glucolink-service")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bind address (overrides config).
    #[arg(short, long)]
    bind: Option<String>,

    /// LibreLinkUp account email (overrides config).
    #[arg(long, env = "GLUCOLINK_EMAIL")]
    email: Option<String>,

    /// LibreLinkUp account password (overrides config).
    #[arg(long, env = "GLUCOLINK_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Disable background collector (API only mode).
    #[arg(long)]
    no_collector: bool,

    /// Write the effective configuration to PATH and exit.
    #[arg(long, value_name = "PATH")]
    write_config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("glucolink_service=info".parse()?)
                .add_directive("tower_http=debug".parse()?),
        )
        .init();

    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };

    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    if let Some(email) = args.email {
        config.account.email = email;
    }
    if let Some(password) = args.password {
        config.account.password = password;
    }
    if args.no_collector {
        config.collector.enabled = false;
    }

    if let Some(path) = &args.write_config {
        config.save(path)?;
        info!("Wrote configuration to {}", path.display());
        return Ok(());
    }

    config.validate()?;

    let store: SharedStore = Arc::new(MemoryStore::new());
    let cancel = CancellationToken::new();

    let status = if config.collector.enabled {
        let client = LinkUpClient::new(config.api.client_options())?;
        info!(base_url = client.base_url(), "Using LibreLinkUp endpoint");

        let collector = Collector::new(
            client,
            Arc::clone(&store),
            config.account.clone(),
            &config.collector,
        );
        let status = collector.status_producer();
        tokio::spawn(collector.run(cancel.clone()));
        status
    } else {
        info!("Background collector disabled");
        state::always_healthy()
    };

    let app = Router::new()
        .merge(api::router())
        .layer(TraceLayer::new_for_http())
        .with_state(AppState::new(store, status));

    let listener = config.server.bind_listener().await?;
    info!("Starting server on {}", listener.local_addr()?);

    let shutdown = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutting down");
                shutdown.cancel();
            }
            Err(e) => warn!("Failed to listen for Ctrl-C: {}", e),
        }
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await?;

    Ok(())
}
