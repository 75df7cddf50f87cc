//! Saga - Ordered steps with reverse-order compensation
//!
//! Steps run strictly in order. When one fails, every step that already
//! completed is compensated, last first, and the original error is returned
//! unchanged. Compensation failures are logged and collected in the
//! [`SagaReport`]; they never replace the original error.

use std::sync::Arc;

use async_trait::async_trait;
use domain::DomainError;
use tracing::{error, info, instrument, warn};

use crate::{error::ApplicationError, execution_context::ExecutionContext};

/// One named unit of a saga
#[async_trait]
pub trait SagaStep: Send + Sync {
    fn name(&self) -> &str;

    async fn execute(&self, ctx: &ExecutionContext) -> Result<(), ApplicationError>;

    /// Undo `execute` after a later step failed with `error`
    ///
    /// Steps with nothing to undo keep the default.
    async fn compensate(
        &self,
        ctx: &ExecutionContext,
        error: &ApplicationError,
    ) -> Result<(), ApplicationError> {
        let _ = (ctx, error);
        Ok(())
    }
}

/// How a saga run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SagaState {
    /// Every step ran
    Completed,
    /// A step failed and completed steps were compensated
    Compensated,
}

/// Outcome of [`Saga::execute`]
#[derive(Debug)]
pub struct SagaReport {
    pub state: SagaState,
    /// Completed steps, in execution order
    pub history: Vec<String>,
    /// Compensated steps, in compensation order
    pub compensated: Vec<String>,
    /// Compensation hooks that failed, with their errors
    pub compensation_failures: Vec<(String, ApplicationError)>,
    /// The error that stopped the saga
    pub error: Option<ApplicationError>,
}

impl SagaReport {
    /// `Ok` for a completed run, the original error otherwise
    pub fn into_result(self) -> Result<Self, ApplicationError> {
        match self.error {
            None => Ok(self),
            Some(err) => Err(err),
        }
    }
}

/// A named, non-empty sequence of steps
pub struct Saga {
    name: String,
    steps: Vec<Arc<dyn SagaStep>>,
}

impl std::fmt::Debug for Saga {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Saga")
            .field("name", &self.name)
            .field("steps", &self.step_names())
            .finish()
    }
}

impl Saga {
    /// Create a saga; fails when `steps` is empty
    pub fn new(name: impl Into<String>, steps: Vec<Arc<dyn SagaStep>>) -> Result<Self, ApplicationError> {
        let name = name.into();
        if steps.is_empty() {
            return Err(DomainError::ValidationError(format!(
                "saga {name} requires at least one step"
            ))
            .into());
        }
        Ok(Self { name, steps })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|step| step.name()).collect()
    }

    /// Run every step; on failure compensate and return the original error
    pub async fn run(&self, ctx: &ExecutionContext) -> Result<SagaReport, ApplicationError> {
        self.execute(ctx).await.into_result()
    }

    /// Run every step and report how the run ended
    #[instrument(skip_all, fields(saga = %self.name, tenant_id = %ctx.tenant_id(), request_id = %ctx.request_id()))]
    pub async fn execute(&self, ctx: &ExecutionContext) -> SagaReport {
        let mut completed: Vec<&Arc<dyn SagaStep>> = Vec::with_capacity(self.steps.len());

        for step in &self.steps {
            match step.execute(ctx).await {
                Ok(()) => completed.push(step),
                Err(err) => {
                    warn!(step = step.name(), error = %err, "Saga step failed, compensating");
                    return Self::compensate(ctx, completed, err).await;
                },
            }
        }

        info!(steps = self.steps.len(), "Saga completed");
        SagaReport {
            state: SagaState::Completed,
            history: completed.iter().map(|step| step.name().to_string()).collect(),
            compensated: Vec::new(),
            compensation_failures: Vec::new(),
            error: None,
        }
    }

    async fn compensate(
        ctx: &ExecutionContext,
        completed: Vec<&Arc<dyn SagaStep>>,
        err: ApplicationError,
    ) -> SagaReport {
        let history: Vec<String> = completed.iter().map(|step| step.name().to_string()).collect();
        let mut compensated = Vec::with_capacity(completed.len());
        let mut compensation_failures = Vec::new();

        for step in completed.into_iter().rev() {
            match step.compensate(ctx, &err).await {
                Ok(()) => compensated.push(step.name().to_string()),
                Err(comp_err) => {
                    error!(step = step.name(), error = %comp_err, "Compensation failed");
                    compensation_failures.push((step.name().to_string(), comp_err));
                },
            }
        }

        info!(compensated = compensated.len(), "Saga compensated");
        SagaReport {
            state: SagaState::Compensated,
            history,
            compensated,
            compensation_failures,
            error: Some(err),
        }
    }
}
