//! GeeCache node
//!
//! Serves one demo group over the peer protocol.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use geecache::{create_router, AppState, CacheError, Config, Getter, Registry};

/// Main entry point for a cache node.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the registry and the demo group
/// 4. Create Axum router with the peer protocol and diagnostics
/// 5. Start HTTP server on configured port
/// 6. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "geecache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting GeeCache node");

    let config = Config::from_env();
    info!(
        "Configuration loaded: group={}, cache_bytes={}, base_path={}, port={}",
        config.group_name, config.cache_bytes, config.base_path, config.server_port
    );

    let registry = Arc::new(Registry::new());
    registry
        .create(&config.group_name, config.cache_bytes, Arc::new(ScoreDb::new()))
        .context("failed to create demo group")?;

    let app = create_router(AppState::from_config(registry, &config));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Node listening on http://{}{}", addr, config.base_path);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Demo data source standing in for a slow database.
struct ScoreDb {
    scores: HashMap<&'static str, &'static str>,
}

impl ScoreDb {
    fn new() -> Self {
        Self {
            scores: HashMap::from([("Tom", "630"), ("Jack", "589"), ("Sam", "567")]),
        }
    }
}

#[async_trait]
impl Getter for ScoreDb {
    async fn get(&self, key: &str) -> geecache::Result<Vec<u8>> {
        info!("[SlowDB] search key {}", key);
        self.scores
            .get(key)
            .map(|v| v.as_bytes().to_vec())
            .ok_or_else(|| CacheError::NotFound(format!("{} not exist", key)))
    }
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                warn!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
