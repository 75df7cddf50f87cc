//! Ability service port
//!
//! Resolves the capability set of the actor in an execution context.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::{ability::Ability, error::ApplicationError, execution_context::ExecutionContext};

/// Port for resolving and invalidating actor capabilities
///
/// Caching, if any, belongs to the implementation.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AbilityServicePort: Send + Sync {
    /// Resolve the capability set of `ctx`'s actor
    async fn resolve_ability(&self, ctx: &ExecutionContext) -> Result<Ability, ApplicationError>;

    /// Drop any cached capability set for `ctx`'s actor
    async fn refresh_ability(&self, ctx: &ExecutionContext) -> Result<(), ApplicationError> {
        let _ = ctx;
        Ok(())
    }
}
