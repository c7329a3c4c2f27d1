use chrono::Utc;
use common::{Coordinates, ExecutionId, ExecutionStatus, TourExecution, TourId, UserId};
use store::ExecutionStore;

use super::progress::{ProgressOutcome, advance};
use crate::catalog::ToursCatalog;
use crate::error::DomainError;

/// Default radius around a key point that counts as having reached it.
pub const DEFAULT_COMPLETION_THRESHOLD_METERS: f64 = 50.0;

/// Tuning for the tour execution tracker.
#[derive(Debug, Clone, Copy)]
pub struct TrackerConfig {
    /// Maximum distance in meters at which the next key point counts as reached.
    pub completion_threshold_meters: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            completion_threshold_meters: DEFAULT_COMPLETION_THRESHOLD_METERS,
        }
    }
}

/// Owns the tour execution state machine.
///
/// ```text
/// start_tour ──► Active ──┬── complete_tour ──► Completed
///                  │      └── abandon_tour  ──► Abandoned
///                  └── check_position (appends the next key point when in range)
/// ```
///
/// Reaching the last key point never completes the tour; the user has to
/// call `complete_tour`. Ownership of an execution is checked by the caller.
pub struct TourExecutionTracker<E: ExecutionStore, C: ToursCatalog> {
    store: E,
    catalog: C,
    config: TrackerConfig,
}

impl<E: ExecutionStore, C: ToursCatalog> TourExecutionTracker<E, C> {
    /// Creates a tracker with the default configuration.
    pub fn new(store: E, catalog: C) -> Self {
        Self::with_config(store, catalog, TrackerConfig::default())
    }

    pub fn with_config(store: E, catalog: C, config: TrackerConfig) -> Self {
        Self {
            store,
            catalog,
            config,
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Starts a new execution of `tour_id` for `user_id`.
    ///
    /// Fails with `Conflict` if the user already has an active execution.
    /// The store enforces the same rule so concurrent starts cannot both win.
    #[tracing::instrument(skip(self))]
    pub async fn start_tour(
        &self,
        tour_id: TourId,
        user_id: UserId,
    ) -> Result<TourExecution, DomainError> {
        if tour_id.is_blank() {
            return Err(DomainError::Validation("tour id is required".to_string()));
        }
        if user_id.is_blank() {
            return Err(DomainError::Validation("user id is required".to_string()));
        }

        if self.store.get_active_by_user(&user_id).await?.is_some() {
            return Err(DomainError::Conflict(
                "user already has an active tour".to_string(),
            ));
        }

        let execution = TourExecution::start(tour_id, user_id, Utc::now());
        self.store.create(&execution).await?;

        metrics::counter!("tour_executions_started_total").increment(1);
        tracing::info!(execution_id = %execution.id, "Tour execution started");

        Ok(execution)
    }

    /// Evaluates the user's position against the next key point of their
    /// active tour and persists the result.
    #[tracing::instrument(skip(self))]
    pub async fn check_position(
        &self,
        user_id: &UserId,
        position: Coordinates,
    ) -> Result<TourExecution, DomainError> {
        if !position.is_valid() {
            return Err(DomainError::Validation(format!(
                "invalid coordinates ({}, {})",
                position.latitude, position.longitude
            )));
        }

        let mut execution = self
            .store
            .get_active_by_user(user_id)
            .await?
            .ok_or_else(|| DomainError::NotFound("no active tour execution".to_string()))?;

        let key_points = self.catalog.ordered_key_points(&execution.tour_id).await?;

        let outcome = advance(
            &mut execution,
            &key_points,
            position,
            self.config.completion_threshold_meters,
            Utc::now(),
        );

        self.store.update(&execution).await?;

        match outcome {
            ProgressOutcome::Reached {
                key_point_id,
                distance_meters,
            } => {
                metrics::counter!("key_points_completed_total").increment(1);
                tracing::info!(
                    execution_id = %execution.id,
                    key_point_id = %key_point_id,
                    distance_meters,
                    "Key point reached"
                );
            }
            ProgressOutcome::NotYet { distance_meters } => {
                tracing::debug!(execution_id = %execution.id, distance_meters, "Next key point not in range");
            }
            ProgressOutcome::AllReached => {
                tracing::debug!(execution_id = %execution.id, "All key points already reached");
            }
        }

        Ok(execution)
    }

    /// Marks the execution as completed.
    #[tracing::instrument(skip(self))]
    pub async fn complete_tour(&self, id: ExecutionId) -> Result<TourExecution, DomainError> {
        self.finish(id, ExecutionStatus::Completed).await
    }

    /// Marks the execution as abandoned.
    #[tracing::instrument(skip(self))]
    pub async fn abandon_tour(&self, id: ExecutionId) -> Result<TourExecution, DomainError> {
        self.finish(id, ExecutionStatus::Abandoned).await
    }

    /// Loads an execution by id.
    pub async fn get_execution(&self, id: ExecutionId) -> Result<TourExecution, DomainError> {
        self.store
            .get_by_id(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("tour execution {id} not found")))
    }

    /// Loads the user's active execution.
    pub async fn active_execution(&self, user_id: &UserId) -> Result<TourExecution, DomainError> {
        self.store
            .get_active_by_user(user_id)
            .await?
            .ok_or_else(|| DomainError::NotFound("no active tour execution".to_string()))
    }

    async fn finish(
        &self,
        id: ExecutionId,
        status: ExecutionStatus,
    ) -> Result<TourExecution, DomainError> {
        let mut execution = self.get_execution(id).await?;

        if execution.status.is_terminal() {
            return Err(DomainError::Conflict(format!(
                "tour execution {id} is already {}",
                execution.status.as_str().to_lowercase()
            )));
        }

        let now = Utc::now();
        execution.status = status;
        execution.end_time = Some(now);
        execution.last_activity = now;
        self.store.update(&execution).await?;

        metrics::counter!("tour_executions_finished_total", "status" => status.as_str())
            .increment(1);
        tracing::info!(execution_id = %id, status = %status, "Tour execution finished");

        Ok(execution)
    }
}
