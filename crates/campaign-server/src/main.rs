//! Campaign Analytics Server
//!
//! Serves campaigns from PostgreSQL and keeps a disk-backed fallback copy
//! that takes over whenever the database cannot be reached.

mod handlers;
mod services;
mod settings;
mod storage;
#[cfg(test)]
mod testing;

use anyhow::{Context, Result};
use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use services::CampaignService;
use settings::Settings;
use storage::{BackgroundSnapshotWriter, Database, FallbackCache, JsonFileSnapshot};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub campaigns: Arc<CampaignService>,
}

#[tokio::main]
async fn main() {
    // Set up panic hook to log crashes
    std::panic::set_hook(Box::new(|info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()));
        let payload = if let Some(s) = info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        eprintln!("[PANIC] at {:?}: {}", location, payload);
        tracing::error!("PANIC at {:?}: {}", location, payload);
    }));

    // A missing .env is normal outside local development
    let dotenv = dotenvy::dotenv();

    // Initialize tracing
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("[FATAL] Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    info!(
        "Starting Campaign Analytics Server v{}",
        env!("CARGO_PKG_VERSION")
    );
    if let Ok(path) = dotenv {
        info!("Loaded environment from {}", path.display());
    }

    if let Err(e) = run_server().await {
        error!("Server failed: {:#}", e);
        std::process::exit(1);
    }
}

async fn run_server() -> Result<()> {
    let settings = Settings::load().context("Failed to load configuration")?;
    info!(
        "Config loaded: bind={}, db={}, fallback={}",
        settings.bind_address,
        settings.redacted_database_url(),
        settings.fallback_file.display()
    );

    // The pool connects on first use, so a database outage at startup only
    // puts the server in degraded mode.
    let db = Arc::new(Database::connect_lazy(&settings).context("Failed to create database pool")?);
    match db.ensure_schema().await {
        Ok(()) => info!("Database schema ready"),
        Err(e) => warn!("Database unavailable at startup, serving fallback data: {}", e),
    }

    let snapshot = Arc::new(JsonFileSnapshot::new(settings.fallback_file.clone()));
    let writer = Arc::new(BackgroundSnapshotWriter::spawn(snapshot.clone()));
    let cache = Arc::new(FallbackCache::load(&snapshot, writer.clone()));

    let state = AppState {
        campaigns: Arc::new(CampaignService::new(db, cache.clone())),
    };

    let app = app(state);

    let addr: SocketAddr = settings
        .bind_address
        .parse()
        .context("Failed to parse bind address")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Flushing fallback snapshot...");
    cache.persist().await;
    writer.flush().await;
    info!("Server stopped");

    Ok(())
}

fn app(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/", get(handlers::health))
        .route(
            "/campaigns",
            get(handlers::campaigns::list).post(handlers::campaigns::create),
        )
        .route("/campaigns/:id", get(handlers::campaigns::get))
        // Debug view of the fallback cache
        .route("/fallback", get(handlers::fallback::list))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
