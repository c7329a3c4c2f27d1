//! API server entry point.

use std::sync::Arc;

use api::{AppState, Backends, Config};
use domain::HttpToursCatalog;
use saga::HttpLikeRemovalClient;
use sqlx::postgres::PgPoolOptions;
use store::{PostgresExecutionStore, PostgresFollowGraph};
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

/// Wires PostgreSQL and the remote services where configured, in-memory
/// implementations otherwise.
async fn build_backends(config: &Config) -> Result<Backends, BoxError> {
    let mut backends = Backends::in_memory();

    if let Some(url) = &config.database_url {
        let pool = PgPoolOptions::new().max_connections(10).connect(url).await?;
        store::run_migrations(&pool).await?;
        backends.executions = Arc::new(PostgresExecutionStore::new(pool.clone()));
        backends.follow_graph = Arc::new(PostgresFollowGraph::new(pool));
        tracing::info!("using PostgreSQL stores");
    } else {
        tracing::warn!("DATABASE_URL not set, using in-memory stores");
    }

    if let Some(url) = &config.tours_service_url {
        backends.catalog = Arc::new(HttpToursCatalog::new(url.as_str(), config.catalog_timeout)?);
        tracing::info!(%url, "using tours service catalog");
    } else {
        tracing::warn!("TOURS_SERVICE_URL not set, using in-memory tours catalog");
    }

    if let Some(url) = &config.blog_service_url {
        backends.likes = Arc::new(HttpLikeRemovalClient::new(url.as_str(), config.blog_timeout)?);
        tracing::info!(%url, "using blog service for like removal");
    } else {
        tracing::warn!("BLOG_SERVICE_URL not set, using in-memory like service");
    }

    Ok(backends)
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // 1. Load configuration
    let config = Config::from_env()?;

    // 2. Initialize tracing
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 3. Install Prometheus metrics recorder
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder()?;

    // 4. Wire stores, collaborators and services
    let backends = build_backends(&config).await?;
    let state = Arc::new(AppState::new(backends, config.tracker_config()));

    // 5. Build the application
    let app = api::create_app(state, metrics_handle);

    // 6. Start server
    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server shut down gracefully");
    Ok(())
}
