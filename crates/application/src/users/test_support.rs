//! In-memory collaborators for the user handler tests

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use domain::{
    AggregateId, AggregateRoot, AuditRecord, DomainEvent, EmailAddress, Scope, TenantId, User,
    UserId, UserSnapshot, Username,
};
use parking_lot::Mutex;

use super::UserServices;
use crate::{
    ability::{Ability, AbilityCoordinator, CapabilityRule},
    audit::AuditCoordinator,
    error::ApplicationError,
    execution_context::ExecutionContext,
    pipeline::ExecutionPipeline,
    ports::{
        AbilityServicePort, AuditAppend, AuditServicePort, EventDispatcherPort, FindCriteria,
        Repository, UserRepository,
    },
};

pub fn tenant(id: &str) -> TenantId {
    TenantId::parse(id).unwrap()
}

pub fn ctx() -> ExecutionContext {
    ExecutionContext::new(tenant("tenant-1"), UserId::parse("admin").unwrap())
}

#[derive(Default)]
pub struct FakeUsers {
    rows: Mutex<HashMap<AggregateId, UserSnapshot>>,
}

impl FakeUsers {
    pub fn len(&self) -> usize {
        self.rows.lock().len()
    }
}

#[async_trait]
impl Repository<User> for FakeUsers {
    async fn find_by_id(&self, id: &AggregateId) -> Result<Option<User>, ApplicationError> {
        let row = self.rows.lock().get(id).cloned();
        Ok(row.map(User::restore_from).transpose()?)
    }

    async fn find_by(&self, criteria: &FindCriteria) -> Result<Vec<User>, ApplicationError> {
        let rows: Vec<UserSnapshot> = self.rows.lock().values().cloned().collect();
        let mut users = Vec::new();
        for row in rows {
            let user = User::restore_from(row)?;
            if criteria.matches_aggregate(&user) {
                users.push(user);
            }
        }
        users.sort_by_key(|user| user.audit_trail().created_at());
        Ok(users)
    }

    async fn save(&self, aggregate: &User) -> Result<(), ApplicationError> {
        self.rows.lock().insert(*aggregate.id(), aggregate.snapshot());
        Ok(())
    }

    async fn delete(&self, id: &AggregateId) -> Result<(), ApplicationError> {
        self.rows.lock().remove(id);
        Ok(())
    }
}

#[async_trait]
impl UserRepository for FakeUsers {
    async fn find_by_email(
        &self,
        tenant_id: &TenantId,
        email: &EmailAddress,
    ) -> Result<Option<User>, ApplicationError> {
        let row = self
            .rows
            .lock()
            .values()
            .find(|row| row.scope.tenant_id() == tenant_id && &row.email == email)
            .cloned();
        Ok(row.map(User::restore_from).transpose()?)
    }
}

#[derive(Default)]
pub struct RecordingDispatcher {
    events: Mutex<Vec<DomainEvent>>,
}

#[async_trait]
impl EventDispatcherPort for RecordingDispatcher {
    async fn dispatch(&self, events: Vec<DomainEvent>) -> Result<(), ApplicationError> {
        self.events.lock().extend(events);
        Ok(())
    }
}

pub struct FixedAbilities {
    ability: Ability,
    refreshed: Mutex<Vec<String>>,
}

#[async_trait]
impl AbilityServicePort for FixedAbilities {
    async fn resolve_ability(&self, _ctx: &ExecutionContext) -> Result<Ability, ApplicationError> {
        Ok(self.ability.clone())
    }

    async fn refresh_ability(&self, ctx: &ExecutionContext) -> Result<(), ApplicationError> {
        self.refreshed.lock().push(ctx.user_id().to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingAudit {
    records: Mutex<Vec<AuditRecord>>,
}

#[async_trait]
impl AuditServicePort for RecordingAudit {
    async fn append(
        &self,
        _ctx: &ExecutionContext,
        record: AuditRecord,
    ) -> Result<AuditAppend, ApplicationError> {
        self.records.lock().push(record);
        Ok(AuditAppend::Completed)
    }
}

pub struct Harness {
    pub users: Arc<FakeUsers>,
    pub events: Arc<RecordingDispatcher>,
    pub abilities: Arc<FixedAbilities>,
    pub audit: Arc<RecordingAudit>,
}

impl Harness {
    pub fn with_rules(rules: Vec<CapabilityRule>) -> Self {
        Self {
            users: Arc::default(),
            events: Arc::default(),
            abilities: Arc::new(FixedAbilities {
                ability: Ability::new(rules),
                refreshed: Mutex::default(),
            }),
            audit: Arc::default(),
        }
    }

    pub fn allowing_all() -> Self {
        Self::with_rules(vec![CapabilityRule::allow("manage", "all")])
    }

    pub fn services(&self) -> UserServices {
        let pipeline = ExecutionPipeline::new(
            AbilityCoordinator::new(Arc::clone(&self.abilities) as Arc<dyn AbilityServicePort>),
            AuditCoordinator::new(Arc::clone(&self.audit) as Arc<dyn AuditServicePort>),
        );
        UserServices::new(
            pipeline,
            Arc::clone(&self.users) as Arc<dyn UserRepository>,
            Arc::clone(&self.events) as Arc<dyn EventDispatcherPort>,
        )
    }

    /// Store a user directly, bypassing handlers and event publication
    pub fn seed_user(&self, scope: Scope) -> AggregateId {
        let suffix = &AggregateId::generate().to_string()[..8];
        let user = User::register(
            scope,
            EmailAddress::new(format!("{suffix}@example.com")).unwrap(),
            Username::new(format!("user_{suffix}")).unwrap(),
            None,
            None,
        )
        .unwrap();
        let id = *user.id();
        self.users.rows.lock().insert(id, user.snapshot());
        id
    }

    pub fn published_types(&self) -> Vec<String> {
        self.events
            .events
            .lock()
            .iter()
            .map(|event| event.event_type().to_string())
            .collect()
    }

    pub fn audited_actions(&self) -> Vec<String> {
        self.audit
            .records
            .lock()
            .iter()
            .map(|record| record.action.clone())
            .collect()
    }

    pub fn refreshed_users(&self) -> Vec<String> {
        self.abilities.refreshed.lock().clone()
    }
}
