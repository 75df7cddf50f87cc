//! Composition root
//!
//! Builds the adapters selected by [`AppConfig`] and wires them into the
//! execution pipeline and the user handlers by constructor injection.

use std::sync::Arc;

use application::{
    AbilityCoordinator, ActivateUserHandler, AssignRoleHandler, AuditCoordinator,
    CreateUserHandler, DeleteUserHandler, ExecutionPipeline, GetUserHandler, ListUsersHandler,
    RestoreUserHandler, SuspendUserHandler, UserServices,
    ports::{AbilityServicePort, AuditReaderPort, AuditServicePort, EventDispatcherPort, UserRepository},
};
use domain::User;
use tracing::{info, instrument};

use crate::{
    adapters::{
        BroadcastEventDispatcher, InMemoryAuditSink, InMemoryRepository, PolicyAbilityService,
    },
    config::{AppConfig, AuditBackend},
    persistence::{AsyncDatabase, AsyncDatabaseConfig, DatabaseError, SqliteAuditSink},
};

/// Fully wired application core
pub struct CoreServices {
    pub config: Arc<AppConfig>,
    pub users: Arc<InMemoryRepository<User>>,
    pub events: Arc<BroadcastEventDispatcher>,
    pub abilities: Arc<PolicyAbilityService>,
    pub audit_log: Arc<dyn AuditReaderPort>,
    pub pipeline: ExecutionPipeline,
    user_services: UserServices,
}

impl std::fmt::Debug for CoreServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreServices")
            .field("environment", &self.config.environment)
            .field("audit_backend", &self.config.audit.backend)
            .field("pipeline", &self.pipeline)
            .finish_non_exhaustive()
    }
}

impl CoreServices {
    /// Build every adapter and handler dependency from `config`
    ///
    /// The SQLite audit backend opens its pool and migrates the schema here.
    #[instrument(skip_all, fields(environment = %config.environment, audit_backend = %config.audit.backend))]
    pub async fn from_config(config: AppConfig) -> Result<Self, DatabaseError> {
        let (audit_sink, audit_log): (Arc<dyn AuditServicePort>, Arc<dyn AuditReaderPort>) =
            match config.audit.backend {
                AuditBackend::Memory => {
                    let sink = Arc::new(InMemoryAuditSink::new());
                    (
                        sink.clone() as Arc<dyn AuditServicePort>,
                        sink as Arc<dyn AuditReaderPort>,
                    )
                },
                AuditBackend::Sqlite => {
                    let mut db_config = AsyncDatabaseConfig::url(config.audit.database_url.clone());
                    if !db_config.is_in_memory() {
                        db_config.max_connections = config.audit.max_connections;
                    }
                    let db = AsyncDatabase::new(&db_config).await?;
                    db.migrate().await?;
                    let sink = Arc::new(SqliteAuditSink::new(db.pool().clone()));
                    (
                        sink.clone() as Arc<dyn AuditServicePort>,
                        sink as Arc<dyn AuditReaderPort>,
                    )
                },
            };

        let users = Arc::new(InMemoryRepository::<User>::new());
        let events = Arc::new(BroadcastEventDispatcher::default());
        let abilities = Arc::new(
            PolicyAbilityService::from_config(&config.ability)
                .with_user_directory(users.clone() as Arc<dyn UserRepository>),
        );

        let pipeline = ExecutionPipeline::new(
            AbilityCoordinator::new(abilities.clone() as Arc<dyn AbilityServicePort>),
            AuditCoordinator::new(audit_sink),
        );
        let user_services = UserServices::new(
            pipeline.clone(),
            users.clone() as Arc<dyn UserRepository>,
            events.clone() as Arc<dyn EventDispatcherPort>,
        );

        info!("Core services wired");
        Ok(Self {
            config: Arc::new(config),
            users,
            events,
            abilities,
            audit_log,
            pipeline,
            user_services,
        })
    }

    pub fn user_services(&self) -> UserServices {
        self.user_services.clone()
    }

    pub fn create_user(&self) -> CreateUserHandler {
        CreateUserHandler::new(self.user_services())
    }

    pub fn activate_user(&self) -> ActivateUserHandler {
        ActivateUserHandler::new(self.user_services())
    }

    pub fn suspend_user(&self) -> SuspendUserHandler {
        SuspendUserHandler::new(self.user_services())
    }

    pub fn assign_role(&self) -> AssignRoleHandler {
        AssignRoleHandler::new(self.user_services())
    }

    pub fn delete_user(&self) -> DeleteUserHandler {
        DeleteUserHandler::new(self.user_services())
    }

    pub fn restore_user(&self) -> RestoreUserHandler {
        RestoreUserHandler::new(self.user_services())
    }

    pub fn get_user(&self) -> GetUserHandler {
        GetUserHandler::new(self.user_services())
    }

    pub fn list_users(&self) -> ListUsersHandler {
        ListUsersHandler::new(self.user_services())
    }
}
