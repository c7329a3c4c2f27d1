//! Saga error types.

use domain::DomainError;
use store::StoreError;
use thiserror::Error;

use crate::state::SagaState;

/// Errors that can occur during saga operations.
#[derive(Debug, Error)]
pub enum SagaError {
    /// A saga step failed; completed steps before it have been compensated.
    ///
    /// `number` is 1-based. `failed_compensations` names the earlier steps
    /// whose compensation also failed, leaving their effects in place; `state`
    /// tells the two outcomes apart.
    #[error("saga failed at step {number} ({step}): {source}")]
    StepFailed {
        step: String,
        number: usize,
        #[source]
        source: Box<SagaError>,
        failed_compensations: Vec<String>,
        state: SagaState,
    },

    /// The follower does not follow the target user.
    #[error("not following this user")]
    NotFollowing,

    /// The like-removal service failed or rejected the request.
    #[error("Like service error: {0}")]
    LikeService(String),

    /// Follow graph store error.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Domain error.
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),
}

impl SagaError {
    /// Name of the failed step, if this is a step failure.
    pub fn failed_step(&self) -> Option<&str> {
        match self {
            SagaError::StepFailed { step, .. } => Some(step),
            _ => None,
        }
    }

    /// Final saga state, if this is a step failure.
    pub fn saga_state(&self) -> Option<SagaState> {
        match self {
            SagaError::StepFailed { state, .. } => Some(*state),
            _ => None,
        }
    }
}

/// Convenience type alias for saga results.
pub type Result<T> = std::result::Result<T, SagaError>;
