//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::DomainError;
use saga::{SagaError, SagaState};
use serde_json::json;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client.
    BadRequest(String),
    /// No caller identity on the request.
    Unauthorized(String),
    /// The caller may not touch the addressed resource.
    Forbidden(String),
    /// Resource not found.
    NotFound(String),
    /// Domain logic error.
    Domain(DomainError),
    /// Saga execution error.
    Saga(SagaError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, failure) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, None),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg, None),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
            ApiError::Domain(err) => {
                let (status, msg) = domain_error_to_response(err);
                (status, msg, None)
            }
            ApiError::Saga(err) => saga_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg, None)
            }
        };

        metrics::counter!("api_errors_total", "status" => status.as_u16().to_string())
            .increment(1);

        let body = match failure {
            Some((step, state)) => json!({ "error": message, "step": step, "sagaState": state }),
            None => json!({ "error": message }),
        };
        (status, axum::Json(body)).into_response()
    }
}

fn domain_error_to_response(err: DomainError) -> (StatusCode, String) {
    match err {
        DomainError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
        DomainError::Conflict(msg) => (StatusCode::CONFLICT, msg),
        DomainError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        DomainError::Upstream(msg) => {
            tracing::warn!(error = %msg, "upstream dependency failed");
            (StatusCode::BAD_GATEWAY, msg)
        }
        DomainError::Store(err) => {
            tracing::error!(error = %err, "store failure");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

type SagaFailure = (String, SagaState);

fn saga_error_to_response(err: SagaError) -> (StatusCode, String, Option<SagaFailure>) {
    match err {
        SagaError::StepFailed {
            ref step, state, ..
        } => {
            let failure = (step.clone(), state);
            (StatusCode::BAD_GATEWAY, err.to_string(), Some(failure))
        }
        SagaError::NotFollowing => (StatusCode::CONFLICT, err.to_string(), None),
        SagaError::LikeService(msg) => (StatusCode::BAD_GATEWAY, msg, None),
        SagaError::Store(err) => {
            let (status, msg) = domain_error_to_response(DomainError::from(err));
            (status, msg, None)
        }
        SagaError::Domain(err) => {
            let (status, msg) = domain_error_to_response(err);
            (status, msg, None)
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

impl From<SagaError> for ApiError {
    fn from(err: SagaError) -> Self {
        ApiError::Saga(err)
    }
}
