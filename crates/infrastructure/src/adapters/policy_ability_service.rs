//! Role-policy ability service
//!
//! Resolves an actor's capabilities from configured role policies. The
//! actor's roles are read from the `roles` context metadata entry and, when
//! a user directory is attached, from the stored user the actor id names.
//! Allow rules of every role come first and forbid rules after them, so a
//! forbid granted by any role wins whatever the role names are. Resolved
//! abilities are cached per tenant and actor until they expire or are
//! refreshed.

use std::{
    collections::{BTreeSet, HashMap},
    sync::Arc,
    time::Duration,
};

use application::{
    Ability, CapabilityRule,
    error::ApplicationError,
    execution_context::ExecutionContext,
    ports::{AbilityServicePort, UserRepository},
};
use async_trait::async_trait;
use domain::{AggregateId, AggregateRoot, Scoped, TenantId, UserId, UserStatus};
use moka::future::Cache;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::config::AbilityAppConfig;

/// Context metadata key listing the actor's roles
pub const ROLES_METADATA_KEY: &str = "roles";

type CacheKey = (TenantId, UserId);

#[derive(Clone)]
struct CachedAbility {
    roles: BTreeSet<String>,
    ability: Ability,
}

/// Ability service backed by role policies
pub struct PolicyAbilityService {
    policies: HashMap<String, Vec<CapabilityRule>>,
    users: Option<Arc<dyn UserRepository>>,
    cache: Cache<CacheKey, CachedAbility>,
}

impl std::fmt::Debug for PolicyAbilityService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyAbilityService")
            .field("roles", &self.policies.keys().collect::<Vec<_>>())
            .field("user_directory", &self.users.is_some())
            .field("cached", &self.cache.entry_count())
            .finish()
    }
}

impl PolicyAbilityService {
    pub fn new(
        policies: HashMap<String, Vec<CapabilityRule>>,
        cache_ttl: Duration,
        max_cached_actors: u64,
    ) -> Self {
        Self {
            policies,
            users: None,
            cache: Cache::builder()
                .max_capacity(max_cached_actors)
                .time_to_live(cache_ttl)
                .build(),
        }
    }

    pub fn from_config(config: &AbilityAppConfig) -> Self {
        Self::new(
            config.roles.clone(),
            Duration::from_secs(config.cache_ttl_secs),
            config.max_cached_actors,
        )
    }

    /// Also read roles from stored users
    #[must_use]
    pub fn with_user_directory(mut self, users: Arc<dyn UserRepository>) -> Self {
        self.users = Some(users);
        self
    }

    async fn roles_of(&self, ctx: &ExecutionContext) -> Result<BTreeSet<String>, ApplicationError> {
        let mut roles: BTreeSet<String> = match ctx.metadata_value(ROLES_METADATA_KEY) {
            Some(Value::Array(values)) => values
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            Some(Value::String(role)) => BTreeSet::from([role.clone()]),
            _ => BTreeSet::new(),
        };

        if let (Some(users), Ok(id)) = (&self.users, AggregateId::parse(ctx.user_id().as_str())) {
            if let Some(user) = users.find_by_id(&id).await? {
                let usable = user.belongs_to_tenant(ctx.tenant_id())
                    && !user.is_deleted()
                    && user.status() == UserStatus::Active;
                if usable {
                    roles.extend(user.roles().iter().cloned());
                }
            }
        }

        Ok(roles)
    }

    fn build_ability(&self, roles: &BTreeSet<String>) -> Ability {
        let (forbids, allows): (Vec<CapabilityRule>, Vec<CapabilityRule>) = roles
            .iter()
            .filter_map(|role| self.policies.get(role))
            .flatten()
            .cloned()
            .partition(|rule| rule.inverted);

        let mut ability = Ability::new(allows);
        ability.extend(forbids);
        ability
    }
}

#[async_trait]
impl AbilityServicePort for PolicyAbilityService {
    #[instrument(skip(self, ctx), fields(tenant_id = %ctx.tenant_id(), user_id = %ctx.user_id()))]
    async fn resolve_ability(&self, ctx: &ExecutionContext) -> Result<Ability, ApplicationError> {
        let key = (ctx.tenant_id().clone(), ctx.user_id().clone());
        let roles = self.roles_of(ctx).await?;

        if let Some(cached) = self.cache.get(&key).await {
            if cached.roles == roles {
                debug!("Ability cache hit");
                return Ok(cached.ability);
            }
        }

        let ability = self.build_ability(&roles);
        debug!(roles = ?roles, rules = ability.rules().len(), "Ability resolved");
        self.cache
            .insert(key, CachedAbility { roles, ability: ability.clone() })
            .await;
        Ok(ability)
    }

    #[instrument(skip(self, ctx), fields(tenant_id = %ctx.tenant_id(), user_id = %ctx.user_id()))]
    async fn refresh_ability(&self, ctx: &ExecutionContext) -> Result<(), ApplicationError> {
        self.cache
            .invalidate(&(ctx.tenant_id().clone(), ctx.user_id().clone()))
            .await;
        debug!("Ability cache entry invalidated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use application::{AbilityDescriptor, ports::Repository};
    use domain::{EmailAddress, Scope, User, Username};
    use serde_json::json;

    use super::*;
    use crate::adapters::InMemoryRepository;

    fn policies() -> HashMap<String, Vec<CapabilityRule>> {
        HashMap::from([
            ("viewer".to_string(), vec![CapabilityRule::allow("read", "User")]),
            (
                "admin".to_string(),
                vec![
                    CapabilityRule::allow("manage", "all"),
                    CapabilityRule::forbid("delete", "Tenant").because("tenants are permanent"),
                ],
            ),
        ])
    }

    fn service() -> PolicyAbilityService {
        PolicyAbilityService::new(policies(), Duration::from_secs(60), 100)
    }

    fn ctx() -> ExecutionContext {
        ExecutionContext::new(TenantId::parse("t1").unwrap(), UserId::parse("u1").unwrap())
    }

    #[tokio::test]
    async fn roles_come_from_context_metadata() {
        let ability = service()
            .resolve_ability(&ctx().with_metadata("roles", json!(["viewer"])))
            .await
            .unwrap();

        assert!(ability.can(&AbilityDescriptor::new("read", "User")));
        assert!(ability.cannot(&AbilityDescriptor::new("create", "User")));
    }

    #[tokio::test]
    async fn unknown_or_missing_roles_deny_everything() {
        let service = service();
        let none = service.resolve_ability(&ctx()).await.unwrap();
        let unknown = service
            .resolve_ability(&ctx().with_metadata("roles", json!("ghost")))
            .await
            .unwrap();

        assert!(none.rules().is_empty());
        assert!(unknown.rules().is_empty());
    }

    #[tokio::test]
    async fn later_forbid_rules_keep_their_reason() {
        let ability = service()
            .resolve_ability(&ctx().with_metadata("roles", json!(["admin"])))
            .await
            .unwrap();

        let descriptor = AbilityDescriptor::new("delete", "Tenant");
        assert!(ability.cannot(&descriptor));
        assert_eq!(
            ability.relevant_rule(&descriptor).and_then(|r| r.reason.as_deref()),
            Some("tenants are permanent")
        );
    }

    #[tokio::test]
    async fn stored_user_roles_apply_after_refresh() {
        let users = Arc::new(InMemoryRepository::<User>::new());
        let service = service().with_user_directory(users.clone());
        let mut user = User::register(
            Scope::tenant(TenantId::parse("t1").unwrap()),
            EmailAddress::new("a@example.com").unwrap(),
            Username::new("alice").unwrap(),
            None,
            None,
        )
        .unwrap();
        user.activate(None).unwrap();
        users.save(&user).await.unwrap();
        let actor = ExecutionContext::new(TenantId::parse("t1").unwrap(), user.user_id());
        let read = AbilityDescriptor::new("read", "User");

        assert!(service.resolve_ability(&actor).await.unwrap().cannot(&read));

        user.assign_role("viewer", None).unwrap();
        users.save(&user).await.unwrap();
        service.refresh_ability(&actor).await.unwrap();

        assert!(service.resolve_ability(&actor).await.unwrap().can(&read));
    }

    #[tokio::test]
    async fn suspended_users_lose_stored_roles() {
        let users = Arc::new(InMemoryRepository::<User>::new());
        let service = service().with_user_directory(users.clone());
        let mut user = User::register(
            Scope::tenant(TenantId::parse("t1").unwrap()),
            EmailAddress::new("a@example.com").unwrap(),
            Username::new("alice").unwrap(),
            None,
            None,
        )
        .unwrap();
        user.assign_role("admin", None).unwrap();
        user.activate(None).unwrap();
        user.suspend(None, None).unwrap();
        users.save(&user).await.unwrap();

        let actor = ExecutionContext::new(TenantId::parse("t1").unwrap(), user.user_id());
        assert!(service.resolve_ability(&actor).await.unwrap().rules().is_empty());
    }

    #[tokio::test]
    async fn forbid_rules_win_regardless_of_role_names() {
        let editor_rules = vec![CapabilityRule::allow("manage", "User")];
        let service = PolicyAbilityService::new(
            HashMap::from([
                ("restricted".to_string(), vec![CapabilityRule::forbid("delete", "User")]),
                ("a_editor".to_string(), editor_rules.clone()),
                ("z_editor".to_string(), editor_rules),
            ]),
            Duration::from_secs(60),
            100,
        );
        let delete = AbilityDescriptor::new("delete", "User");

        for editor in ["a_editor", "z_editor"] {
            let ability = service
                .resolve_ability(&ctx().with_metadata("roles", json!(["restricted", editor])))
                .await
                .unwrap();
            assert!(ability.cannot(&delete), "{editor} overrode the forbid rule");
            assert!(ability.can(&AbilityDescriptor::new("update", "User")));
        }
    }
}
