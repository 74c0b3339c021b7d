//! geofind-api - HTTP API server for geofind

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use geofind_api::config::{AppConfig, StoreBackend};
use geofind_api::{router, AppState};
use geofind_core::defaults;
use geofind_db::{log_pool_metrics, Database, InMemoryLocationStore};
use geofind_geocode::NominatimGeocoder;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with configurable output
    //
    // Environment variables:
    //   LOG_FORMAT  - "json" or "text" (default: "text")
    //   LOG_FILE    - path to log file (optional, enables file logging)
    //   LOG_ANSI    - "true"/"false" override ANSI colors (auto-detected by default)
    //   RUST_LOG    - standard env filter (default: "geofind_api=debug,tower_http=debug")
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "geofind_api=debug,geofind_db=info,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(env_filter);

    // Optionally create a file appender with daily rotation
    let _file_guard = if let Some(ref path) = log_file {
        let file_dir = std::path::Path::new(path)
            .parent()
            .unwrap_or(std::path::Path::new("."));
        let file_name = std::path::Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("geofind-api.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(log_ansi.unwrap_or(false));
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        // Console-only output
        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer();
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    };

    info!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );

    let config = AppConfig::from_env()?;

    let (stores, store_backend) = match &config.store {
        StoreBackend::Postgres { url } => {
            info!(subsystem = "db", "Connecting to database...");
            let db = Database::connect_with_config(url, &config.pool).await?;
            db.migrate().await?;
            log_pool_metrics(db.pool());
            info!(subsystem = "db", "Database ready");
            (db.stores(), "postgres")
        }
        StoreBackend::Memory => {
            warn!(
                subsystem = "db",
                "Using in-memory store (data is lost on restart)"
            );
            (InMemoryLocationStore::new().stores(), "memory")
        }
    };

    let geocoder = Arc::new(NominatimGeocoder::new(config.geocoder.clone())?);
    let state = AppState::new(stores, geocoder, config.history_retention, store_backend);
    let _sweeper = state.selections.spawn_sweeper(Duration::from_secs(
        defaults::SELECTION_SWEEP_INTERVAL_SECS,
    ));
    let app = router(state);

    let addr: SocketAddr = config.bind_addr().parse()?;
    info!(%addr, store = store_backend, "Starting server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
