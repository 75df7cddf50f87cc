//! End-to-end scenarios through the wired core
//!
//! Every scenario runs real adapters: in-memory repository, policy ability
//! service, broadcast dispatcher and an audit sink selected by config.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::{collections::HashMap, sync::Arc};

use application::{
    ActivateUserCommand, ApplicationError, AssignRoleCommand, AuditQuery, AuditReaderPort,
    CapabilityRule, CommandHandler, CreateUserCommand, DeleteUserCommand, ExecutionContext,
    GetUserQuery, ListUsersQuery, QueryHandler, Saga, SagaState, SagaStep, UserDto,
};
use async_trait::async_trait;
use domain::{AggregateId, EmailAddress, OrganizationId, TenantId, UserId, UserStatus, Username};
use infrastructure::{AppConfig, AuditBackend, CoreServices};
use parking_lot::Mutex;
use serde_json::json;

// ============================================================================
// Test Helpers
// ============================================================================

fn config() -> AppConfig {
    let mut config = AppConfig::default();
    config.ability.roles = HashMap::from([
        ("admin".to_string(), vec![CapabilityRule::allow("manage", "all")]),
        ("viewer".to_string(), vec![CapabilityRule::allow("read", "User")]),
    ]);
    config
}

async fn core() -> CoreServices {
    CoreServices::from_config(config()).await.expect("core wiring")
}

fn admin(tenant: &str) -> ExecutionContext {
    ExecutionContext::new(TenantId::parse(tenant).unwrap(), UserId::parse("admin").unwrap())
        .with_metadata("roles", json!(["admin"]))
}

fn viewer(tenant: &str) -> ExecutionContext {
    ExecutionContext::new(TenantId::parse(tenant).unwrap(), UserId::parse("viewer").unwrap())
        .with_metadata("roles", json!(["viewer"]))
}

fn create(ctx: ExecutionContext, email: &str) -> CreateUserCommand {
    CreateUserCommand::new(
        ctx,
        EmailAddress::new(email).unwrap(),
        Username::new("john_doe").unwrap(),
    )
}

async fn create_user(core: &CoreServices, ctx: ExecutionContext, email: &str) -> UserDto {
    core.create_user().execute(create(ctx, email)).await.expect("create user")
}

fn id_of(dto: &UserDto) -> AggregateId {
    AggregateId::parse(&dto.id).unwrap()
}

// ============================================================================
// User lifecycle
// ============================================================================

mod user_lifecycle {
    use super::*;

    #[tokio::test]
    async fn create_user_saves_once_and_publishes_created_event() {
        let core = core().await;
        let mut events = core.events.subscribe();

        let dto = create_user(&core, admin("t1"), "user@example.com").await;

        assert_eq!(dto.status, UserStatus::PendingActivation);
        assert_eq!(dto.tenant_id, "t1");
        assert_eq!(core.users.len(), 1);

        let event = events.recv().await.unwrap();
        assert_eq!(event.event_type(), "UserCreatedEvent");
        assert_eq!(event.aggregate_id(), dto.id);
        assert_eq!(event.triggered_by().map(UserId::as_str), Some("admin"));
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn duplicate_email_in_tenant_is_already_exists() {
        let core = core().await;
        create_user(&core, admin("t1"), "user@example.com").await;

        let err = core
            .create_user()
            .execute(create(admin("t1"), "user@example.com"))
            .await
            .unwrap_err();

        assert!(matches!(err, ApplicationError::Domain(ref e) if e.is_already_exists()));
        assert_eq!(core.users.len(), 1);
    }

    #[tokio::test]
    async fn activate_user_transitions_and_publishes() {
        let core = core().await;
        let created = create_user(&core, admin("t1"), "user@example.com").await;
        let mut events = core.events.subscribe();

        let dto = core
            .activate_user()
            .execute(ActivateUserCommand::new(admin("t1"), id_of(&created)))
            .await
            .unwrap();

        assert_eq!(dto.status, UserStatus::Active);
        assert!(dto.updated_at >= created.updated_at);
        assert_eq!(events.recv().await.unwrap().event_type(), "UserActivatedEvent");
    }

    #[tokio::test]
    async fn activating_unknown_user_is_not_found() {
        let core = core().await;

        let err = core
            .activate_user()
            .execute(ActivateUserCommand::new(admin("t1"), AggregateId::generate()))
            .await
            .unwrap_err();

        assert!(matches!(err, ApplicationError::Domain(ref e) if e.is_not_found()));
    }

    #[tokio::test]
    async fn activating_twice_is_an_invalid_transition() {
        let core = core().await;
        let created = create_user(&core, admin("t1"), "user@example.com").await;
        let activate = core.activate_user();
        activate
            .execute(ActivateUserCommand::new(admin("t1"), id_of(&created)))
            .await
            .unwrap();

        let err = activate
            .execute(ActivateUserCommand::new(admin("t1"), id_of(&created)))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), application::ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn soft_deleted_users_are_hidden_but_retained() {
        let core = core().await;
        let created = create_user(&core, admin("t1"), "user@example.com").await;
        core.delete_user()
            .execute(DeleteUserCommand::new(admin("t1"), id_of(&created)))
            .await
            .unwrap();

        let listed = core.list_users().execute(ListUsersQuery::new(admin("t1"))).await.unwrap();
        assert!(listed.is_empty());
        assert_eq!(core.users.len(), 1);

        let with_deleted = core
            .list_users()
            .execute(ListUsersQuery::new(admin("t1")).including_deleted())
            .await
            .unwrap();
        assert_eq!(with_deleted.len(), 1);
        assert!(with_deleted[0].is_deleted);
    }
}

// ============================================================================
// Tenancy and authorization
// ============================================================================

mod isolation {
    use super::*;

    #[tokio::test]
    async fn other_tenants_cannot_read_or_list() {
        let core = core().await;
        let created = create_user(&core, admin("t1"), "user@example.com").await;

        let err = core
            .get_user()
            .execute(GetUserQuery::new(admin("t2"), id_of(&created)))
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::ScopeViolation(_)));

        let listed = core.list_users().execute(ListUsersQuery::new(admin("t2"))).await.unwrap();
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn organization_context_narrows_listing() {
        let core = core().await;
        let org = OrganizationId::parse("org-1").unwrap();
        create_user(&core, admin("t1").with_organization(org.clone()), "a@example.com").await;
        create_user(
            &core,
            admin("t1").with_organization(OrganizationId::parse("org-2").unwrap()),
            "b@example.com",
        )
        .await;

        let in_org = core
            .list_users()
            .execute(ListUsersQuery::new(admin("t1").with_organization(org)))
            .await
            .unwrap();
        let whole_tenant = core.list_users().execute(ListUsersQuery::new(admin("t1"))).await.unwrap();

        assert_eq!(in_org.len(), 1);
        assert_eq!(in_org[0].email, "a@example.com");
        assert_eq!(whole_tenant.len(), 2);
    }

    #[tokio::test]
    async fn forbidden_operations_are_not_executed_or_audited() {
        let core = core().await;

        let err = core
            .create_user()
            .execute(create(viewer("t1"), "user@example.com"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ApplicationError::Forbidden { ref action, ref subject, .. } if action == "create" && subject == "User"
        ));
        assert!(core.users.is_empty());
        let audited = core
            .audit_log
            .query(&AuditQuery::for_tenant(TenantId::parse("t1").unwrap()))
            .await
            .unwrap();
        assert!(audited.is_empty());
    }

    #[tokio::test]
    async fn actors_without_roles_are_forbidden() {
        let core = core().await;
        let anonymous =
            ExecutionContext::new(TenantId::parse("t1").unwrap(), UserId::parse("nobody").unwrap());

        let err = core.list_users().execute(ListUsersQuery::new(anonymous)).await.unwrap_err();

        assert!(matches!(err, ApplicationError::Forbidden { .. }));
    }

    #[tokio::test]
    async fn assigned_roles_take_effect_for_the_stored_user() {
        let core = core().await;
        let created = create_user(&core, admin("t1"), "user@example.com").await;
        let id = id_of(&created);
        core.activate_user()
            .execute(ActivateUserCommand::new(admin("t1"), id))
            .await
            .unwrap();
        let as_user = ExecutionContext::new(TenantId::parse("t1").unwrap(), UserId::from(&id));

        let denied = core.list_users().execute(ListUsersQuery::new(as_user.clone())).await;
        assert!(matches!(denied, Err(ApplicationError::Forbidden { .. })));

        core.assign_role()
            .execute(AssignRoleCommand::new(admin("t1"), id, "viewer"))
            .await
            .unwrap();

        let listed = core.list_users().execute(ListUsersQuery::new(as_user)).await.unwrap();
        assert_eq!(listed.len(), 1);
    }
}

// ============================================================================
// Auditing
// ============================================================================

mod auditing {
    use super::*;

    #[tokio::test]
    async fn successful_operations_are_audited_with_context() {
        let core = core().await;
        let ctx = admin("t1").with_metadata("ip", json!("10.0.0.1"));
        let request_id = ctx.request_id();

        let dto = create_user(&core, ctx, "user@example.com").await;

        let records = core
            .audit_log
            .query(&AuditQuery::for_tenant(TenantId::parse("t1").unwrap()))
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.action, "users.create");
        assert_eq!(record.user_id.as_str(), "admin");
        assert_eq!(record.request_id, Some(request_id));
        assert_eq!(record.metadata["ip"], json!("10.0.0.1"));
        assert_eq!(record.metadata["ability_action"], json!("create"));
        assert_eq!(record.metadata["ability_subject"], json!("User"));
        assert_eq!(record.payload.as_ref().unwrap()["email"], json!("user@example.com"));
        assert_eq!(record.result.as_ref().unwrap()["id"], json!(dto.id));
    }

    #[tokio::test]
    async fn failed_operations_are_not_audited() {
        let core = core().await;
        core.activate_user()
            .execute(ActivateUserCommand::new(admin("t1"), AggregateId::generate()))
            .await
            .unwrap_err();

        let records = core
            .audit_log
            .query(&AuditQuery::for_tenant(TenantId::parse("t1").unwrap()))
            .await
            .unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn sqlite_backend_persists_audit_records() {
        let mut config = config();
        config.audit.backend = AuditBackend::Sqlite;
        config.audit.database_url = "sqlite::memory:".to_string();
        let core = CoreServices::from_config(config).await.unwrap();

        create_user(&core, admin("t1"), "a@example.com").await;
        core.list_users().execute(ListUsersQuery::new(admin("t1"))).await.unwrap();

        let records = core
            .audit_log
            .query(&AuditQuery::for_tenant(TenantId::parse("t1").unwrap()))
            .await
            .unwrap();
        let actions: Vec<_> = records.iter().map(|r| r.action.as_str()).collect();
        assert_eq!(actions, vec!["users.create", "users.list"]);
        assert!(records.iter().all(|r| r.id.is_some()));

        let creates = core
            .audit_log
            .query(&AuditQuery::for_tenant(TenantId::parse("t1").unwrap()).with_action("users.create"))
            .await
            .unwrap();
        assert_eq!(creates.len(), 1);
    }
}

// ============================================================================
// Sagas over handlers
// ============================================================================

mod sagas {
    use super::*;

    type Log = Arc<Mutex<Vec<String>>>;

    struct CreateAccount {
        core: Arc<CoreServices>,
        created: Mutex<Option<AggregateId>>,
        log: Log,
    }

    #[async_trait]
    impl SagaStep for CreateAccount {
        fn name(&self) -> &str {
            "A"
        }

        async fn execute(&self, ctx: &ExecutionContext) -> Result<(), ApplicationError> {
            let dto = self
                .core
                .create_user()
                .execute(create(ctx.clone(), "saga@example.com"))
                .await?;
            *self.created.lock() = Some(id_of(&dto));
            Ok(())
        }

        async fn compensate(
            &self,
            ctx: &ExecutionContext,
            _error: &ApplicationError,
        ) -> Result<(), ApplicationError> {
            self.log.lock().push("A".to_string());
            let id = *self.created.lock();
            if let Some(id) = id {
                self.core
                    .delete_user()
                    .execute(DeleteUserCommand::new(ctx.clone(), id))
                    .await?;
            }
            Ok(())
        }
    }

    struct Notify {
        log: Log,
    }

    #[async_trait]
    impl SagaStep for Notify {
        fn name(&self) -> &str {
            "B"
        }

        async fn execute(&self, _ctx: &ExecutionContext) -> Result<(), ApplicationError> {
            Ok(())
        }

        async fn compensate(
            &self,
            _ctx: &ExecutionContext,
            _error: &ApplicationError,
        ) -> Result<(), ApplicationError> {
            self.log.lock().push("B".to_string());
            Ok(())
        }
    }

    struct Provision;

    #[async_trait]
    impl SagaStep for Provision {
        fn name(&self) -> &str {
            "C"
        }

        async fn execute(&self, _ctx: &ExecutionContext) -> Result<(), ApplicationError> {
            Err(ApplicationError::ExternalService("mailbox quota exceeded".to_string()))
        }
    }

    #[tokio::test]
    async fn failing_step_compensates_completed_steps_in_reverse() {
        let core = Arc::new(core().await);
        let log = Log::default();
        let saga = Saga::new(
            "onboarding",
            vec![
                Arc::new(CreateAccount {
                    core: Arc::clone(&core),
                    created: Mutex::new(None),
                    log: Arc::clone(&log),
                }) as Arc<dyn SagaStep>,
                Arc::new(Notify { log: Arc::clone(&log) }),
                Arc::new(Provision),
            ],
        )
        .unwrap();

        let report = saga.execute(&admin("t1")).await;

        assert_eq!(report.state, SagaState::Compensated);
        assert_eq!(report.history, vec!["A", "B"]);
        assert_eq!(*log.lock(), vec!["B", "A"]);
        assert!(matches!(
            report.error,
            Some(ApplicationError::ExternalService(ref msg)) if msg == "mailbox quota exceeded"
        ));

        let remaining = core.list_users().execute(ListUsersQuery::new(admin("t1"))).await.unwrap();
        assert!(remaining.is_empty());
        assert_eq!(core.users.len(), 1);
    }
}
