//! Execution Pipeline - authorize, handle, audit, return

use std::{future::Future, sync::Arc};

use serde::Serialize;
use serde_json::Value;
use tracing::{info, instrument};

use super::operation::{AuthorizedOperation, Operation};
use crate::{
    ability::{AbilityCoordinator, AbilityDescriptor},
    audit::{AuditCoordinator, AuditRequest},
    error::ApplicationError,
};

/// Audit metadata key holding the checked ability action
pub const ABILITY_ACTION_KEY: &str = "ability_action";

/// Audit metadata key holding the checked ability subject
pub const ABILITY_SUBJECT_KEY: &str = "ability_subject";

/// Runs operations through a fixed sequence of steps
///
/// 1. authorize (authorized runs only)
/// 2. handle
/// 3. audit the successful result
/// 4. return it
///
/// A failing step ends the run: a denied operation is never handled and a
/// failed one is never audited.
#[derive(Debug, Clone)]
pub struct ExecutionPipeline {
    abilities: Arc<AbilityCoordinator>,
    audit: Arc<AuditCoordinator>,
}

impl ExecutionPipeline {
    pub fn new(abilities: AbilityCoordinator, audit: AuditCoordinator) -> Self {
        Self {
            abilities: Arc::new(abilities),
            audit: Arc::new(audit),
        }
    }

    pub fn abilities(&self) -> &AbilityCoordinator {
        &self.abilities
    }

    pub fn audit(&self) -> &AuditCoordinator {
        &self.audit
    }

    /// Authorize `operation`, then handle and audit it
    #[instrument(
        skip_all,
        fields(
            operation = operation.operation_name(),
            tenant_id = %operation.context().tenant_id(),
            user_id = %operation.context().user_id(),
            request_id = %operation.context().request_id(),
        )
    )]
    pub async fn run_authorized<Op, R, F, Fut>(
        &self,
        operation: &Op,
        handle: F,
    ) -> Result<R, ApplicationError>
    where
        Op: AuthorizedOperation + ?Sized,
        R: Serialize + Send,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<R, ApplicationError>> + Send,
    {
        let descriptor = operation.ability_descriptor();
        self.abilities
            .ensure_authorized(operation.context(), &descriptor)
            .await?;
        self.handle_and_audit(operation, Some(&descriptor), handle)
            .await
    }

    /// Handle and audit `operation` without an ability check
    ///
    /// For internal operations that are not driven by an actor's capabilities.
    #[instrument(
        skip_all,
        fields(
            operation = operation.operation_name(),
            tenant_id = %operation.context().tenant_id(),
            user_id = %operation.context().user_id(),
            request_id = %operation.context().request_id(),
        )
    )]
    pub async fn run_unauthorized<Op, R, F, Fut>(
        &self,
        operation: &Op,
        handle: F,
    ) -> Result<R, ApplicationError>
    where
        Op: Operation + ?Sized,
        R: Serialize + Send,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<R, ApplicationError>> + Send,
    {
        self.handle_and_audit(operation, None, handle).await
    }

    async fn handle_and_audit<Op, R, F, Fut>(
        &self,
        operation: &Op,
        descriptor: Option<&AbilityDescriptor>,
        handle: F,
    ) -> Result<R, ApplicationError>
    where
        Op: Operation + ?Sized,
        R: Serialize + Send,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<R, ApplicationError>> + Send,
    {
        let result = handle().await?;

        let serialized = serde_json::to_value(&result).map_err(|e| {
            ApplicationError::AuditRecord(format!(
                "cannot serialize result of {}: {e}",
                operation.operation_name()
            ))
        })?;
        let mut request = AuditRequest::new(operation.operation_name())
            .with_payload(operation.audit_payload())
            .with_result(serialized);
        if let Some(descriptor) = descriptor {
            request = request
                .with_metadata(ABILITY_ACTION_KEY, Value::from(descriptor.action.as_str()))
                .with_metadata(ABILITY_SUBJECT_KEY, Value::from(descriptor.subject.as_str()));
        }
        self.audit.record(operation.context(), request).await?;

        info!("Operation completed");
        Ok(result)
    }
}
