//! Domain error types.

use store::StoreError;
use thiserror::Error;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The request is malformed: missing identifiers, self-targeting, bad coordinates.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The request conflicts with current state.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The addressed resource does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A remote dependency failed or timed out.
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// An error occurred in the backing store.
    #[error("Store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for DomainError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ActiveExecutionExists { .. } => {
                DomainError::Conflict("user already has an active tour".to_string())
            }
            StoreError::ExecutionFinished(id) => {
                DomainError::Conflict(format!("tour execution {id} is already finished"))
            }
            StoreError::ExecutionNotFound(_) | StoreError::FollowEdgeNotFound { .. } => {
                DomainError::NotFound(err.to_string())
            }
            other => DomainError::Store(other),
        }
    }
}
