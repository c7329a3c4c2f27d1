//! The unit of work a saga is built from.

use async_trait::async_trait;

use crate::error::SagaError;

/// One action of a saga together with the action that undoes it.
///
/// Steps are built fresh for every run and hold everything they need to
/// execute and compensate.
#[async_trait]
pub trait SagaStep: Send + Sync {
    /// Human-readable step name, reported when the step fails.
    fn name(&self) -> &str;

    /// Performs the step.
    async fn execute(&self) -> Result<(), SagaError>;

    /// Undoes a previously successful `execute`.
    ///
    /// Only called for steps that completed, in reverse order.
    async fn compensate(&self) -> Result<(), SagaError>;
}
