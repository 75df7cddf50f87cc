//! Audit Coordinator - Writes audit records for completed operations

use std::{collections::BTreeMap, sync::Arc};

use domain::AuditRecord;
use futures::StreamExt;
use serde_json::Value;
use tracing::{debug, error, instrument};

use crate::{
    error::ApplicationError,
    execution_context::ExecutionContext,
    ports::{AuditAppend, AuditServicePort},
};

/// Caller-supplied part of an audit record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuditRequest {
    pub action: String,
    pub payload: Option<Value>,
    pub result: Option<Value>,
    pub metadata: BTreeMap<String, Value>,
}

impl AuditRequest {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_payload(mut self, payload: Option<Value>) -> Self {
        self.payload = payload;
        self
    }

    #[must_use]
    pub fn with_result(mut self, result: Value) -> Self {
        self.result = Some(result);
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// Records audit entries through an [`AuditServicePort`]
///
/// Failures are never swallowed: every sink error surfaces as
/// `ApplicationError::AuditRecord`.
#[derive(Clone, Default)]
pub struct AuditCoordinator {
    service: Option<Arc<dyn AuditServicePort>>,
}

impl std::fmt::Debug for AuditCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditCoordinator")
            .field("configured", &self.service.is_some())
            .finish()
    }
}

impl AuditCoordinator {
    pub fn new(service: Arc<dyn AuditServicePort>) -> Self {
        Self {
            service: Some(service),
        }
    }

    pub const fn unconfigured() -> Self {
        Self { service: None }
    }

    pub const fn is_configured(&self) -> bool {
        self.service.is_some()
    }

    /// Build the record for `request` in `ctx`
    ///
    /// Tenant, user, organization, department and request id come from the
    /// context. Metadata is merged with request keys overriding context keys.
    pub fn build_record(ctx: &ExecutionContext, request: AuditRequest) -> AuditRecord {
        let mut record = AuditRecord::new(ctx.tenant_id().clone(), ctx.user_id().clone(), request.action)
            .with_scope(ctx.scope())
            .with_request_id(ctx.request_id())
            .with_metadata(ctx.metadata().clone())
            .with_metadata(request.metadata);
        record.payload = request.payload;
        record.result = request.result;
        record
    }

    /// Write an audit record and wait until the sink acknowledges it
    #[instrument(
        skip(self, ctx, request),
        fields(
            tenant_id = %ctx.tenant_id(),
            user_id = %ctx.user_id(),
            request_id = %ctx.request_id(),
            action = %request.action,
        )
    )]
    pub async fn record(
        &self,
        ctx: &ExecutionContext,
        request: AuditRequest,
    ) -> Result<(), ApplicationError> {
        let service = self
            .service
            .as_ref()
            .ok_or(ApplicationError::ConfigurationMissing("audit service"))?;

        let record = Self::build_record(ctx, request);
        let outcome = service.append(ctx, record).await.map_err(into_audit_error)?;

        match outcome {
            AuditAppend::Completed => {},
            AuditAppend::Pending(mut ack) => match ack.next().await {
                Some(Ok(())) => {},
                Some(Err(e)) => return Err(into_audit_error(e)),
                None => {
                    error!("Audit sink closed without acknowledging the record");
                    return Err(ApplicationError::AuditRecord(
                        "audit sink closed without acknowledging the record".to_string(),
                    ));
                },
            },
        }

        debug!("Audit record written");
        Ok(())
    }
}

fn into_audit_error(err: ApplicationError) -> ApplicationError {
    match err {
        ApplicationError::AuditRecord(_) => err,
        other => {
            error!(error = %other, "Audit write failed");
            ApplicationError::AuditRecord(other.to_string())
        },
    }
}
