//! Final state of a saga run.

use serde::Serialize;

/// How a saga run ended.
///
/// ```text
/// all steps ok ──────────────────────────► Completed
/// step failed ──► every compensation ok ─► Compensated
///             └─► some compensation failed ► CompensationFailed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SagaState {
    /// Every step succeeded.
    Completed,

    /// A step failed and every earlier step was undone.
    Compensated,

    /// A step failed and at least one earlier step could not be undone.
    CompensationFailed,
}

impl SagaState {
    /// State reached after a failing step, given the compensations that failed.
    pub fn after_failure(failed_compensations: &[String]) -> Self {
        if failed_compensations.is_empty() {
            SagaState::Compensated
        } else {
            SagaState::CompensationFailed
        }
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            SagaState::Completed => "Completed",
            SagaState::Compensated => "Compensated",
            SagaState::CompensationFailed => "CompensationFailed",
        }
    }
}

impl std::fmt::Display for SagaState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
