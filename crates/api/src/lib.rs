//! HTTP API server for the tour-guide coordination core.
//!
//! Provides REST endpoints for following users, the unfollow saga and tour
//! execution tracking, with structured logging (tracing) and Prometheus
//! metrics.

pub mod config;
pub mod error;
pub mod principal;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use domain::{FollowService, InMemoryToursCatalog, ToursCatalog, TourExecutionTracker, TrackerConfig};
use metrics_exporter_prometheus::PrometheusHandle;
use saga::{InMemoryLikeService, LikeRemovalService, UnfollowCoordinator};
use store::{ExecutionStore, FollowGraphStore, InMemoryExecutionStore, InMemoryFollowGraph};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::Config;
pub use error::ApiError;
pub use principal::Principal;

/// Storage and remote collaborators the services are wired to.
#[derive(Clone)]
pub struct Backends {
    pub executions: Arc<dyn ExecutionStore>,
    pub follow_graph: Arc<dyn FollowGraphStore>,
    pub catalog: Arc<dyn ToursCatalog>,
    pub likes: Arc<dyn LikeRemovalService>,
}

impl Backends {
    /// In-memory stores and collaborators, for tests and local runs.
    pub fn in_memory() -> Self {
        Self {
            executions: Arc::new(InMemoryExecutionStore::new()),
            follow_graph: Arc::new(InMemoryFollowGraph::new()),
            catalog: Arc::new(InMemoryToursCatalog::new()),
            likes: Arc::new(InMemoryLikeService::new()),
        }
    }
}

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub tracker: TourExecutionTracker<Arc<dyn ExecutionStore>, Arc<dyn ToursCatalog>>,
    pub follows: FollowService<Arc<dyn FollowGraphStore>>,
    pub unfollow: UnfollowCoordinator<Arc<dyn FollowGraphStore>, Arc<dyn LikeRemovalService>>,
}

impl AppState {
    pub fn new(backends: Backends, tracker_config: TrackerConfig) -> Self {
        Self {
            tracker: TourExecutionTracker::with_config(
                backends.executions,
                backends.catalog,
                tracker_config,
            ),
            follows: FollowService::new(backends.follow_graph.clone()),
            unfollow: UnfollowCoordinator::new(backends.follow_graph, backends.likes),
        }
    }
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::system::metrics))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::system::health))
        .route("/api/follow", post(routes::follows::follow))
        .route("/api/unfollow", post(routes::follows::unfollow))
        .route("/api/users/{user_id}/followers", get(routes::follows::followers))
        .route("/api/users/{user_id}/following", get(routes::follows::following))
        .route(
            "/api/users/{user_id}/recommendations",
            get(routes::follows::recommendations),
        )
        .route(
            "/api/users/{user_id}/is-following",
            get(routes::follows::is_following),
        )
        .route(
            "/tour-executions/start/{tour_id}",
            post(routes::executions::start),
        )
        .route(
            "/tour-executions/check-position",
            post(routes::executions::check_position),
        )
        .route("/tour-executions/active", get(routes::executions::active))
        .route(
            "/tour-executions/{execution_id}",
            get(routes::executions::get),
        )
        .route(
            "/tour-executions/{execution_id}/complete",
            post(routes::executions::complete),
        )
        .route(
            "/tour-executions/{execution_id}/abandon",
            post(routes::executions::abandon),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
