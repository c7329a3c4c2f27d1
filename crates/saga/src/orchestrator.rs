//! Sequential saga execution with reverse, best-effort compensation.

use std::time::Instant;

use uuid::Uuid;

use crate::error::SagaError;
use crate::state::SagaState;
use crate::step::SagaStep;

/// Outcome of a saga run in which every step succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SagaRun {
    pub saga_id: Uuid,
    pub saga_type: String,
    pub state: SagaState,
    pub completed_steps: Vec<String>,
}

/// Runs saga steps in order and compensates on the first failure.
///
/// There is no retry and no saga-wide deadline: every step is bounded only
/// by its own client timeout, and compensation always runs once a step
/// has failed.
#[derive(Debug, Clone)]
pub struct SagaOrchestrator {
    saga_type: String,
}

impl SagaOrchestrator {
    /// Creates an orchestrator for sagas of the given type.
    pub fn new(saga_type: impl Into<String>) -> Self {
        Self {
            saga_type: saga_type.into(),
        }
    }

    pub fn saga_type(&self) -> &str {
        &self.saga_type
    }

    /// Executes `steps` strictly in order.
    ///
    /// On the first failing step every earlier step is compensated in reverse
    /// order and `SagaError::StepFailed` is returned with the failing step's
    /// own error as its source.
    #[tracing::instrument(
        skip(self, steps),
        fields(saga_type = %self.saga_type, saga_id = tracing::field::Empty)
    )]
    pub async fn execute(
        &self,
        steps: Vec<Box<dyn SagaStep + '_>>,
    ) -> Result<SagaRun, SagaError> {
        metrics::counter!("saga_executions_total").increment(1);
        let saga_start = Instant::now();
        let saga_id = Uuid::new_v4();
        tracing::Span::current().record("saga_id", tracing::field::display(saga_id));

        let mut completed_steps = Vec::with_capacity(steps.len());

        for (index, step) in steps.iter().enumerate() {
            let number = index + 1;
            tracing::info!(step = step.name(), number, "saga step started");

            if let Err(err) = step.execute().await {
                tracing::warn!(step = step.name(), number, error = %err, "saga step failed");

                tracing::info!(executed = index, "starting saga compensation");
                let failed_compensations = compensate(&steps[..index]).await;
                let state = SagaState::after_failure(&failed_compensations);

                let duration = saga_start.elapsed().as_secs_f64();
                metrics::histogram!("saga_duration_seconds").record(duration);
                metrics::counter!("saga_failed").increment(1);
                tracing::warn!(
                    %saga_id,
                    %state,
                    failed_step = step.name(),
                    compensation_failures = failed_compensations.len(),
                    "saga failed"
                );

                return Err(SagaError::StepFailed {
                    step: step.name().to_string(),
                    number,
                    source: Box::new(err),
                    failed_compensations,
                    state,
                });
            }

            tracing::info!(step = step.name(), number, "saga step completed");
            completed_steps.push(step.name().to_string());
        }

        let duration = saga_start.elapsed().as_secs_f64();
        metrics::histogram!("saga_duration_seconds").record(duration);
        metrics::counter!("saga_completed").increment(1);
        tracing::info!(%saga_id, duration, "saga completed successfully");

        Ok(SagaRun {
            saga_id,
            saga_type: self.saga_type.clone(),
            state: SagaState::Completed,
            completed_steps,
        })
    }
}

/// Compensates `executed` in reverse order and returns the names of the
/// steps whose compensation failed.
async fn compensate(executed: &[Box<dyn SagaStep + '_>]) -> Vec<String> {
    let mut failed = Vec::new();

    for (index, step) in executed.iter().enumerate().rev() {
        let number = index + 1;
        metrics::counter!("saga_compensations_total").increment(1);

        match step.compensate().await {
            Ok(()) => tracing::info!(step = step.name(), number, "compensation completed"),
            Err(err) => {
                // Left inconsistent; reported to the caller only through `failed_compensations`
                metrics::counter!("saga_compensation_failures_total").increment(1);
                tracing::warn!(step = step.name(), number, error = %err, "compensation failed");
                failed.push(step.name().to_string());
            }
        }
    }

    failed
}
