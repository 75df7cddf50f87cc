//! Ability Coordinator - Gates operations on the actor's capabilities

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use super::capability::AbilityDescriptor;
use crate::{
    error::ApplicationError, execution_context::ExecutionContext, ports::AbilityServicePort,
};

/// Authorizes operations through an [`AbilityServicePort`]
///
/// The service is optional so the core can run without the feature; any
/// check made without one fails with `ConfigurationMissing`.
#[derive(Clone, Default)]
pub struct AbilityCoordinator {
    service: Option<Arc<dyn AbilityServicePort>>,
}

impl std::fmt::Debug for AbilityCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AbilityCoordinator")
            .field("configured", &self.service.is_some())
            .finish()
    }
}

impl AbilityCoordinator {
    /// Create a coordinator backed by `service`
    pub fn new(service: Arc<dyn AbilityServicePort>) -> Self {
        Self {
            service: Some(service),
        }
    }

    /// Create a coordinator without an ability service
    pub const fn unconfigured() -> Self {
        Self { service: None }
    }

    pub const fn is_configured(&self) -> bool {
        self.service.is_some()
    }

    fn service(&self) -> Result<&Arc<dyn AbilityServicePort>, ApplicationError> {
        self.service
            .as_ref()
            .ok_or(ApplicationError::ConfigurationMissing("ability service"))
    }

    /// Fail with `Forbidden` unless the actor may perform `descriptor`
    ///
    /// Resolves the capability set once per call.
    #[instrument(
        skip(self, ctx, descriptor),
        fields(
            tenant_id = %ctx.tenant_id(),
            user_id = %ctx.user_id(),
            action = %descriptor.action,
            subject = %descriptor.subject,
        )
    )]
    pub async fn ensure_authorized(
        &self,
        ctx: &ExecutionContext,
        descriptor: &AbilityDescriptor,
    ) -> Result<(), ApplicationError> {
        let ability = self.service()?.resolve_ability(ctx).await?;

        if ability.can(descriptor) {
            debug!("Access granted");
            return Ok(());
        }

        let reason = ability
            .relevant_rule(descriptor)
            .and_then(|rule| rule.reason.clone());
        warn!(reason = ?reason, "Access denied");
        Err(ApplicationError::forbidden(
            descriptor.action.clone(),
            descriptor.subject.clone(),
            reason,
        ))
    }

    /// Invalidate the cached capability set of `ctx`'s actor
    #[instrument(skip(self, ctx), fields(tenant_id = %ctx.tenant_id(), user_id = %ctx.user_id()))]
    pub async fn refresh_ability(&self, ctx: &ExecutionContext) -> Result<(), ApplicationError> {
        self.service()?.refresh_ability(ctx).await?;
        debug!("Ability refreshed");
        Ok(())
    }
}
