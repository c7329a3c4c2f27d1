use std::sync::Arc;

use async_trait::async_trait;
use common::{ExecutionId, TourExecution, UserId};

use crate::Result;

/// Durable store for tour execution documents.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait ExecutionStore: Send + Sync {
    /// Loads an execution by ID. Returns None if it doesn't exist.
    async fn get_by_id(&self, id: ExecutionId) -> Result<Option<TourExecution>>;

    /// Loads the user's active execution, if any.
    async fn get_active_by_user(&self, user_id: &UserId) -> Result<Option<TourExecution>>;

    /// Inserts a new execution.
    ///
    /// Fails with `ActiveExecutionExists` if the execution is active and the
    /// user already has another active execution. The check and the insert
    /// are a single atomic operation.
    async fn create(&self, execution: &TourExecution) -> Result<()>;

    /// Overwrites a stored execution.
    ///
    /// Only records whose *stored* status is active can be written; a
    /// terminal record yields `ExecutionFinished`, a missing one
    /// `ExecutionNotFound`.
    async fn update(&self, execution: &TourExecution) -> Result<()>;
}

#[async_trait]
impl<T: ExecutionStore + ?Sized> ExecutionStore for Arc<T> {
    async fn get_by_id(&self, id: ExecutionId) -> Result<Option<TourExecution>> {
        (**self).get_by_id(id).await
    }

    async fn get_active_by_user(&self, user_id: &UserId) -> Result<Option<TourExecution>> {
        (**self).get_active_by_user(user_id).await
    }

    async fn create(&self, execution: &TourExecution) -> Result<()> {
        (**self).create(execution).await
    }

    async fn update(&self, execution: &TourExecution) -> Result<()> {
        (**self).update(execution).await
    }
}
