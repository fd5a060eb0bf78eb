//! Help desk HTTP server.
//!
//! Admits customer tickets to service desks under a per-desk capacity limit.

mod config;
mod metrics;

use anyhow::Context;
use axum::Router;
use axum::routing::get;
use config::{Config, StorageBackend};
use helpdesk_core::{HelpdeskStore, SystemClock};
use helpdesk_postgres::PostgresHelpdeskStore;
use helpdesk_testing::InMemoryHelpdeskStore;
use helpdesk_web::{AppState, router};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine.
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "helpdesk=info,helpdesk_core=info,helpdesk_web=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting help desk server");

    let config = Config::from_env().context("invalid configuration")?;
    info!(
        storage = %config.storage,
        capacity_limit = config.admission.capacity_limit,
        serial_policy = %config.admission.serial_conflict_policy,
        serialize_per_desk = config.admission.serialize_per_desk,
        "Configuration loaded"
    );

    let metrics = if config.server.metrics_enabled {
        Some(metrics::install().context("failed to install metrics")?)
    } else {
        None
    };

    match (config.storage, config.database.as_ref()) {
        (StorageBackend::Postgres, Some(database)) => {
            info!("Connecting to PostgreSQL...");
            let store = PostgresHelpdeskStore::connect(&database.url, database.max_connections)
                .await
                .context("failed to connect to PostgreSQL")?;
            store.migrate().await.context("failed to run migrations")?;
            info!("PostgreSQL connected and migrated");
            serve(store, &config, metrics).await
        }
        (StorageBackend::Postgres, None) => {
            anyhow::bail!("postgres storage selected without a database configuration")
        }
        (StorageBackend::Memory, _) => {
            warn!("Using in-memory storage; data is lost on restart");
            serve(InMemoryHelpdeskStore::new(), &config, metrics).await
        }
    }
}

async fn serve<S: HelpdeskStore>(
    store: S,
    config: &Config,
    metrics: Option<PrometheusHandle>,
) -> anyhow::Result<()> {
    let state = AppState::new(store, Arc::new(SystemClock), config.admission.clone());
    let mut app = router(state);
    if let Some(handle) = metrics {
        app = app.merge(metrics_router(handle));
    }

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
    info!(address = %address, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server shut down");
    Ok(())
}

fn metrics_router(handle: PrometheusHandle) -> Router {
    Router::new().route("/metrics", get(move || std::future::ready(handle.render())))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C signal, shutting down gracefully...");
        },
        () = terminate => {
            info!("Received SIGTERM signal, shutting down gracefully...");
        },
    }
}
