//! User management use cases

mod commands;
mod dto;
mod queries;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use domain::{AggregateId, AggregateRoot, DomainError, User};

pub use commands::{
    ActivateUserCommand, ActivateUserHandler, AssignRoleCommand, AssignRoleHandler,
    CreateUserCommand, CreateUserHandler, DeleteUserCommand, DeleteUserHandler,
    RestoreUserCommand, RestoreUserHandler, SuspendUserCommand, SuspendUserHandler,
};
pub use dto::UserDto;
pub use queries::{GetUserHandler, GetUserQuery, ListUsersHandler, ListUsersQuery};

use crate::{
    error::ApplicationError,
    execution_context::ExecutionContext,
    pipeline::{ExecutionPipeline, assert_scope, publish_events},
    ports::{EventDispatcherPort, UserRepository},
};

/// Ability subject of every user operation
pub const USER_SUBJECT: &str = "User";

/// Collaborators shared by the user handlers
#[derive(Clone)]
pub struct UserServices {
    pipeline: ExecutionPipeline,
    users: Arc<dyn UserRepository>,
    events: Arc<dyn EventDispatcherPort>,
}

impl std::fmt::Debug for UserServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserServices")
            .field("pipeline", &self.pipeline)
            .finish_non_exhaustive()
    }
}

impl UserServices {
    pub fn new(
        pipeline: ExecutionPipeline,
        users: Arc<dyn UserRepository>,
        events: Arc<dyn EventDispatcherPort>,
    ) -> Self {
        Self {
            pipeline,
            users,
            events,
        }
    }

    pub const fn pipeline(&self) -> &ExecutionPipeline {
        &self.pipeline
    }

    pub fn users(&self) -> &dyn UserRepository {
        self.users.as_ref()
    }

    /// Load a user the context may act on
    ///
    /// Fails with `NotFound` when absent and `ScopeViolation` when the user
    /// lives outside the context's scope.
    async fn load(&self, ctx: &ExecutionContext, id: &AggregateId) -> Result<User, ApplicationError> {
        let user = self
            .users
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found(User::AGGREGATE_TYPE, id.to_string()))?;
        assert_scope(ctx, &user)?;
        Ok(user)
    }

    /// Persist the user, then publish its pending events
    async fn save_and_publish(&self, user: &mut User) -> Result<(), ApplicationError> {
        self.users.save(user).await?;
        publish_events(user, self.events.as_ref()).await?;
        Ok(())
    }
}
