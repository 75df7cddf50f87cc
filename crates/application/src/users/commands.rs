//! User commands and their handlers

use async_trait::async_trait;
use domain::{AggregateId, AggregateRoot, DomainError, EmailAddress, User, Username};
use serde_json::{Value, json};
use tracing::{info, instrument, warn};

use super::{USER_SUBJECT, UserDto, UserServices};
use crate::{
    ability::AbilityDescriptor,
    error::ApplicationError,
    execution_context::ExecutionContext,
    pipeline::{AuthorizedOperation, Command, CommandHandler, ExecutionPipeline, Operation},
};

/// Implements the operation traits for a user command
macro_rules! user_command {
    ($command:ty, $name:literal, $action:literal) => {
        impl Operation for $command {
            fn context(&self) -> &ExecutionContext {
                &self.context
            }

            fn operation_name(&self) -> &'static str {
                $name
            }

            fn audit_payload(&self) -> Option<Value> {
                Some(self.payload())
            }
        }

        impl AuthorizedOperation for $command {
            fn ability_descriptor(&self) -> AbilityDescriptor {
                AbilityDescriptor::new($action, USER_SUBJECT)
            }
        }

        impl Command for $command {}
    };
}

/// Declares a handler struct around [`UserServices`]
macro_rules! user_handler {
    ($(#[$meta:meta])* $handler:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $handler {
            services: UserServices,
        }

        impl $handler {
            pub const fn new(services: UserServices) -> Self {
                Self { services }
            }
        }
    };
}

// ============================================================================
// Create
// ============================================================================

/// Register a new user in the context's scope
#[derive(Debug, Clone)]
pub struct CreateUserCommand {
    pub context: ExecutionContext,
    pub email: EmailAddress,
    pub username: Username,
    pub display_name: Option<String>,
}

impl CreateUserCommand {
    pub const fn new(context: ExecutionContext, email: EmailAddress, username: Username) -> Self {
        Self {
            context,
            email,
            username,
            display_name: None,
        }
    }

    #[must_use]
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    fn payload(&self) -> Value {
        json!({
            "email": self.email,
            "username": self.username,
            "display_name": self.display_name,
        })
    }
}

user_command!(CreateUserCommand, "users.create", "create");

user_handler!(
    /// Creates users; the email must be unused within the tenant
    CreateUserHandler
);

#[async_trait]
impl CommandHandler for CreateUserHandler {
    type Command = CreateUserCommand;
    type Output = UserDto;

    fn pipeline(&self) -> &ExecutionPipeline {
        self.services.pipeline()
    }

    #[instrument(skip(self, command), fields(email = %command.email))]
    async fn handle(&self, command: &CreateUserCommand) -> Result<UserDto, ApplicationError> {
        let ctx = &command.context;

        let existing = self
            .services
            .users()
            .find_by_email(ctx.tenant_id(), &command.email)
            .await?;
        if existing.is_some() {
            warn!("Email already registered in tenant");
            return Err(
                DomainError::already_exists(User::AGGREGATE_TYPE, command.email.as_str()).into(),
            );
        }

        let mut user = User::register(
            ctx.scope().clone(),
            command.email.clone(),
            command.username.clone(),
            command.display_name.clone(),
            Some(ctx.user_id()),
        )?;
        self.services.save_and_publish(&mut user).await?;

        info!(user_id = %user.id(), "User created");
        Ok(UserDto::from_user(&user))
    }
}

// ============================================================================
// Activate
// ============================================================================

/// Move a user to `ACTIVE`
#[derive(Debug, Clone)]
pub struct ActivateUserCommand {
    pub context: ExecutionContext,
    pub user_id: AggregateId,
}

impl ActivateUserCommand {
    pub const fn new(context: ExecutionContext, user_id: AggregateId) -> Self {
        Self { context, user_id }
    }

    fn payload(&self) -> Value {
        json!({ "user_id": self.user_id })
    }
}

user_command!(ActivateUserCommand, "users.activate", "activate");

user_handler!(ActivateUserHandler);

#[async_trait]
impl CommandHandler for ActivateUserHandler {
    type Command = ActivateUserCommand;
    type Output = UserDto;

    fn pipeline(&self) -> &ExecutionPipeline {
        self.services.pipeline()
    }

    #[instrument(skip(self, command), fields(user_id = %command.user_id))]
    async fn handle(&self, command: &ActivateUserCommand) -> Result<UserDto, ApplicationError> {
        let ctx = &command.context;
        let mut user = self.services.load(ctx, &command.user_id).await?;

        user.activate(Some(ctx.user_id()))?;
        self.services.save_and_publish(&mut user).await?;

        info!("User activated");
        Ok(UserDto::from_user(&user))
    }
}

// ============================================================================
// Suspend
// ============================================================================

/// Move a user to `SUSPENDED`
#[derive(Debug, Clone)]
pub struct SuspendUserCommand {
    pub context: ExecutionContext,
    pub user_id: AggregateId,
    pub reason: Option<String>,
}

impl SuspendUserCommand {
    pub const fn new(context: ExecutionContext, user_id: AggregateId) -> Self {
        Self {
            context,
            user_id,
            reason: None,
        }
    }

    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    fn payload(&self) -> Value {
        json!({ "user_id": self.user_id, "reason": self.reason })
    }
}

user_command!(SuspendUserCommand, "users.suspend", "suspend");

user_handler!(SuspendUserHandler);

#[async_trait]
impl CommandHandler for SuspendUserHandler {
    type Command = SuspendUserCommand;
    type Output = UserDto;

    fn pipeline(&self) -> &ExecutionPipeline {
        self.services.pipeline()
    }

    #[instrument(skip(self, command), fields(user_id = %command.user_id))]
    async fn handle(&self, command: &SuspendUserCommand) -> Result<UserDto, ApplicationError> {
        let ctx = &command.context;
        let mut user = self.services.load(ctx, &command.user_id).await?;

        user.suspend(command.reason.clone(), Some(ctx.user_id()))?;
        self.services.save_and_publish(&mut user).await?;

        info!("User suspended");
        Ok(UserDto::from_user(&user))
    }
}

// ============================================================================
// Assign role
// ============================================================================

/// Grant a role to a user
#[derive(Debug, Clone)]
pub struct AssignRoleCommand {
    pub context: ExecutionContext,
    pub user_id: AggregateId,
    pub role: String,
}

impl AssignRoleCommand {
    pub fn new(context: ExecutionContext, user_id: AggregateId, role: impl Into<String>) -> Self {
        Self {
            context,
            user_id,
            role: role.into(),
        }
    }

    fn payload(&self) -> Value {
        json!({ "user_id": self.user_id, "role": self.role })
    }
}

user_command!(AssignRoleCommand, "users.assign_role", "assign-role");

user_handler!(
    /// Grants roles and invalidates the target's cached abilities
    AssignRoleHandler
);

#[async_trait]
impl CommandHandler for AssignRoleHandler {
    type Command = AssignRoleCommand;
    type Output = UserDto;

    fn pipeline(&self) -> &ExecutionPipeline {
        self.services.pipeline()
    }

    #[instrument(skip(self, command), fields(user_id = %command.user_id, role = %command.role))]
    async fn handle(&self, command: &AssignRoleCommand) -> Result<UserDto, ApplicationError> {
        let ctx = &command.context;
        let mut user = self.services.load(ctx, &command.user_id).await?;

        if user.assign_role(&command.role, Some(ctx.user_id()))? {
            self.services.save_and_publish(&mut user).await?;
            self.services
                .pipeline()
                .abilities()
                .refresh_ability(&ctx.for_user(user.user_id()))
                .await?;
            info!("Role assigned");
        }

        Ok(UserDto::from_user(&user))
    }
}

// ============================================================================
// Delete / restore
// ============================================================================

/// Soft-delete a user
#[derive(Debug, Clone)]
pub struct DeleteUserCommand {
    pub context: ExecutionContext,
    pub user_id: AggregateId,
}

impl DeleteUserCommand {
    pub const fn new(context: ExecutionContext, user_id: AggregateId) -> Self {
        Self { context, user_id }
    }

    fn payload(&self) -> Value {
        json!({ "user_id": self.user_id })
    }
}

user_command!(DeleteUserCommand, "users.delete", "delete");

user_handler!(DeleteUserHandler);

#[async_trait]
impl CommandHandler for DeleteUserHandler {
    type Command = DeleteUserCommand;
    type Output = UserDto;

    fn pipeline(&self) -> &ExecutionPipeline {
        self.services.pipeline()
    }

    #[instrument(skip(self, command), fields(user_id = %command.user_id))]
    async fn handle(&self, command: &DeleteUserCommand) -> Result<UserDto, ApplicationError> {
        let ctx = &command.context;
        let mut user = self.services.load(ctx, &command.user_id).await?;

        if user.mark_deleted(Some(ctx.user_id()))? {
            self.services.save_and_publish(&mut user).await?;
            info!("User deleted");
        }

        Ok(UserDto::from_user(&user))
    }
}

/// Undo a soft-delete
#[derive(Debug, Clone)]
pub struct RestoreUserCommand {
    pub context: ExecutionContext,
    pub user_id: AggregateId,
}

impl RestoreUserCommand {
    pub const fn new(context: ExecutionContext, user_id: AggregateId) -> Self {
        Self { context, user_id }
    }

    fn payload(&self) -> Value {
        json!({ "user_id": self.user_id })
    }
}

user_command!(RestoreUserCommand, "users.restore", "restore");

user_handler!(RestoreUserHandler);

#[async_trait]
impl CommandHandler for RestoreUserHandler {
    type Command = RestoreUserCommand;
    type Output = UserDto;

    fn pipeline(&self) -> &ExecutionPipeline {
        self.services.pipeline()
    }

    #[instrument(skip(self, command), fields(user_id = %command.user_id))]
    async fn handle(&self, command: &RestoreUserCommand) -> Result<UserDto, ApplicationError> {
        let ctx = &command.context;
        let mut user = self.services.load(ctx, &command.user_id).await?;

        if user.restore(Some(ctx.user_id()))? {
            self.services.save_and_publish(&mut user).await?;
            info!("User restored");
        }

        Ok(UserDto::from_user(&user))
    }
}

#[cfg(test)]
mod tests {
    use domain::{Scope, TenantId, UserStatus};

    use super::*;
    use crate::{
        ability::CapabilityRule,
        users::test_support::{Harness, ctx, tenant},
    };

    fn create_command() -> CreateUserCommand {
        CreateUserCommand::new(
            ctx(),
            EmailAddress::new("user@example.com").unwrap(),
            Username::new("john_doe").unwrap(),
        )
    }

    #[tokio::test]
    async fn create_persists_one_user_and_publishes_created_event() {
        let harness = Harness::allowing_all();
        let handler = CreateUserHandler::new(harness.services());

        let dto = handler.execute(create_command()).await.unwrap();

        assert_eq!(dto.status, UserStatus::PendingActivation);
        assert_eq!(dto.email, "user@example.com");
        assert_eq!(harness.users.len(), 1);
        assert_eq!(harness.published_types(), vec!["UserCreatedEvent"]);
        assert_eq!(harness.audited_actions(), vec!["users.create"]);
    }

    #[tokio::test]
    async fn duplicate_email_in_tenant_is_rejected() {
        let harness = Harness::allowing_all();
        let handler = CreateUserHandler::new(harness.services());
        handler.execute(create_command()).await.unwrap();

        let err = handler.execute(create_command()).await.unwrap_err();

        assert!(matches!(err, ApplicationError::Domain(ref e) if e.is_already_exists()));
        assert_eq!(harness.users.len(), 1);
        assert_eq!(harness.audited_actions(), vec!["users.create"]);
    }

    #[tokio::test]
    async fn same_email_in_other_tenant_is_allowed() {
        let harness = Harness::allowing_all();
        let handler = CreateUserHandler::new(harness.services());
        handler.execute(create_command()).await.unwrap();

        let other = ExecutionContext::new(tenant("tenant-2"), domain::UserId::parse("admin").unwrap());
        let mut command = create_command();
        command.context = other;
        handler.execute(command).await.unwrap();

        assert_eq!(harness.users.len(), 2);
    }

    #[tokio::test]
    async fn activate_transitions_and_publishes() {
        let harness = Harness::allowing_all();
        let created = CreateUserHandler::new(harness.services())
            .execute(create_command())
            .await
            .unwrap();
        let id = AggregateId::parse(&created.id).unwrap();

        let dto = ActivateUserHandler::new(harness.services())
            .execute(ActivateUserCommand::new(ctx(), id))
            .await
            .unwrap();

        assert_eq!(dto.status, UserStatus::Active);
        assert_eq!(
            harness.published_types(),
            vec!["UserCreatedEvent", "UserActivatedEvent"]
        );
    }

    #[tokio::test]
    async fn activating_missing_user_is_not_found() {
        let harness = Harness::allowing_all();
        let err = ActivateUserHandler::new(harness.services())
            .execute(ActivateUserCommand::new(ctx(), AggregateId::generate()))
            .await
            .unwrap_err();

        assert!(matches!(err, ApplicationError::Domain(ref e) if e.is_not_found()));
        assert!(harness.audited_actions().is_empty());
    }

    #[tokio::test]
    async fn cross_tenant_command_is_a_scope_violation() {
        let harness = Harness::allowing_all();
        let foreign = harness.seed_user(Scope::tenant(TenantId::parse("tenant-2").unwrap()));

        let err = SuspendUserHandler::new(harness.services())
            .execute(SuspendUserCommand::new(ctx(), foreign))
            .await
            .unwrap_err();

        assert!(matches!(err, ApplicationError::ScopeViolation(_)));
    }

    #[tokio::test]
    async fn denied_command_is_neither_handled_nor_audited() {
        let harness = Harness::with_rules(vec![CapabilityRule::allow("read", "User")]);

        let err = CreateUserHandler::new(harness.services())
            .execute(create_command())
            .await
            .unwrap_err();

        assert!(matches!(err, ApplicationError::Forbidden { .. }));
        assert_eq!(harness.users.len(), 0);
        assert!(harness.audited_actions().is_empty());
    }

    #[tokio::test]
    async fn assign_role_refreshes_target_ability() {
        let harness = Harness::allowing_all();
        let id = harness.seed_user(Scope::tenant(tenant("tenant-1")));

        let dto = AssignRoleHandler::new(harness.services())
            .execute(AssignRoleCommand::new(ctx(), id, "editor"))
            .await
            .unwrap();

        assert_eq!(dto.roles, vec!["editor"]);
        assert_eq!(harness.refreshed_users(), vec![id.to_string()]);
    }

    #[tokio::test]
    async fn delete_and_restore_are_idempotent() {
        let harness = Harness::allowing_all();
        let id = harness.seed_user(Scope::tenant(tenant("tenant-1")));
        let delete = DeleteUserHandler::new(harness.services());
        let restore = RestoreUserHandler::new(harness.services());

        assert!(delete.execute(DeleteUserCommand::new(ctx(), id)).await.unwrap().is_deleted);
        assert!(delete.execute(DeleteUserCommand::new(ctx(), id)).await.unwrap().is_deleted);
        assert!(!restore.execute(RestoreUserCommand::new(ctx(), id)).await.unwrap().is_deleted);

        assert_eq!(
            harness.published_types(),
            vec!["AggregateDeletedEvent", "AggregateRestoredEvent"]
        );
        assert_eq!(
            harness.audited_actions(),
            vec!["users.delete", "users.delete", "users.restore"]
        );
    }
}
