//! Tour execution endpoints.
//!
//! Only tourists may call these. Ownership of an execution is enforced here;
//! the tracker trusts its caller.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{Coordinates, ExecutionId, TourExecution, TourId};
use serde::Deserialize;

use crate::AppState;
use crate::error::ApiError;
use crate::principal::{Principal, Tourist};

#[derive(Debug, Deserialize)]
pub struct CheckPositionRequest {
    pub latitude: f64,
    pub longitude: f64,
}

/// POST /tour-executions/start/{tourId}
#[tracing::instrument(skip(state))]
pub async fn start(
    State(state): State<Arc<AppState>>,
    Tourist(principal): Tourist,
    Path(tour_id): Path<String>,
) -> Result<(StatusCode, Json<TourExecution>), ApiError> {
    let execution = state
        .tracker
        .start_tour(TourId::new(tour_id), principal.user_id)
        .await?;
    Ok((StatusCode::CREATED, Json(execution)))
}

/// POST /tour-executions/check-position
#[tracing::instrument(skip(state))]
pub async fn check_position(
    State(state): State<Arc<AppState>>,
    Tourist(principal): Tourist,
    Json(req): Json<CheckPositionRequest>,
) -> Result<Json<TourExecution>, ApiError> {
    let execution = state
        .tracker
        .check_position(
            &principal.user_id,
            Coordinates::new(req.latitude, req.longitude),
        )
        .await?;
    Ok(Json(execution))
}

/// POST /tour-executions/{executionId}/complete
#[tracing::instrument(skip(state))]
pub async fn complete(
    State(state): State<Arc<AppState>>,
    Tourist(principal): Tourist,
    Path(execution_id): Path<String>,
) -> Result<Json<TourExecution>, ApiError> {
    let id = owned_execution(&state, &principal, &execution_id).await?;
    Ok(Json(state.tracker.complete_tour(id).await?))
}

/// POST /tour-executions/{executionId}/abandon
#[tracing::instrument(skip(state))]
pub async fn abandon(
    State(state): State<Arc<AppState>>,
    Tourist(principal): Tourist,
    Path(execution_id): Path<String>,
) -> Result<Json<TourExecution>, ApiError> {
    let id = owned_execution(&state, &principal, &execution_id).await?;
    Ok(Json(state.tracker.abandon_tour(id).await?))
}

/// GET /tour-executions/active
#[tracing::instrument(skip(state))]
pub async fn active(
    State(state): State<Arc<AppState>>,
    Tourist(principal): Tourist,
) -> Result<Json<TourExecution>, ApiError> {
    Ok(Json(
        state.tracker.active_execution(&principal.user_id).await?,
    ))
}

/// GET /tour-executions/{executionId}
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Tourist(principal): Tourist,
    Path(execution_id): Path<String>,
) -> Result<Json<TourExecution>, ApiError> {
    let execution = state
        .tracker
        .get_execution(parse_execution_id(&execution_id)?)
        .await?;
    principal.ensure_owns(&execution)?;
    Ok(Json(execution))
}

async fn owned_execution(
    state: &AppState,
    principal: &Principal,
    execution_id: &str,
) -> Result<ExecutionId, ApiError> {
    let id = parse_execution_id(execution_id)?;
    let execution = state.tracker.get_execution(id).await?;
    principal.ensure_owns(&execution)?;
    Ok(id)
}

fn parse_execution_id(id: &str) -> Result<ExecutionId, ApiError> {
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid execution ID format: {e}")))?;
    Ok(ExecutionId::from_uuid(uuid))
}
