//! HTTP surface of the attendance service.
//!
//! | route | handler |
//! |---|---|
//! | `GET /` | service banner |
//! | `GET /health` | database round trip, 200 or 503 |
//! | `GET /api/demoMode` | current demo flag |
//! | `PUT /api/demoMode` | toggle demo mode and persist it |
//! | `POST /api/attendance` | record one scan |
//! | `GET /api/attendance?range=all\|today\|week` | newest-first listing |

mod error;
mod handlers;
mod router;
mod types;

use std::sync::Arc;

use anyhow::Context;
use serde_json::json;
use tokio::{net::TcpListener, signal};
use tracing::{info, warn};

use crate::config::Config;
use crate::db;
use crate::demo_mode::{DemoMode, DEMO_MODE_KEY};
use crate::pool::DbPool;

use router::build_router;
use types::AppState;

impl AppState {
    /// Opens the database, creates the schema, and restores demo mode.
    /// Any failure to reach the database here is fatal.
    pub async fn new(config: Config) -> anyhow::Result<Arc<Self>> {
        let path = config.database_path.clone();
        let persisted_demo = tokio::task::spawn_blocking(move || -> anyhow::Result<String> {
            info!(path = %path.display(), "opening database");
            let conn = db::open_db(&path)
                .with_context(|| format!("cannot open database {}", path.display()))?;
            let probe = db::probe(&conn).context("database connectivity probe failed")?;
            info!(
                sqlite_version = %probe.sqlite_version,
                server_time = %probe.server_time,
                "database connected"
            );

            Ok(match db::settings_get(&conn, DEMO_MODE_KEY) {
                Ok(Some(v)) => v,
                Ok(None) => "false".to_string(),
                Err(e) => {
                    warn!(error = %e, "could not read demo mode setting, defaulting to off");
                    "false".to_string()
                }
            })
        })
        .await??;

        let demo_mode = DemoMode::initialize(&persisted_demo);
        info!(enabled = demo_mode.is_enabled(), "demo mode initialized");

        let pool = DbPool::new(
            &config.database_path,
            config.pool_max_connections,
            config.pool_acquire_timeout,
        );

        Ok(Arc::new(Self {
            config,
            pool,
            demo_mode,
        }))
    }
}

pub async fn start_server() -> anyhow::Result<()> {
    info!("Loading configuration...");
    let config = Config::load()?;

    info!("Initializing state...");
    let state = AppState::new(config).await?;

    let app = build_router(Arc::clone(&state))?;

    let address = format!("{}:{}", state.config.bind_addr, state.config.port);
    info!("Binding to {address}");
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
    let local = listener.local_addr()?;
    info!("Server running on {local}");

    // Supervisors (and the integration tests) read this line to learn the port.
    println!("{}", json!({ "event": "listening", "addr": local.to_string() }));

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server failed")?;

    info!("Server shutting down...");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                warn!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
