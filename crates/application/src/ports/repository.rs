//! Repository ports
//!
//! The persistence seam for aggregates. Adapters decide how aggregates are
//! stored; the scoping contract every adapter must honor is encoded once in
//! [`FindCriteria::matches`].

use async_trait::async_trait;
use domain::{
    AggregateId, AggregateRoot, DepartmentId, EmailAddress, OrganizationId, Scope, TenantId, User,
};

use crate::{error::ApplicationError, execution_context::ExecutionContext};

/// Scoped lookup criteria for [`Repository::find_by`]
///
/// # Examples
///
/// ```
/// use application::FindCriteria;
/// use domain::{AggregateId, OrganizationId, Scope, TenantId};
///
/// let tenant = TenantId::parse("tenant-1").unwrap();
/// let criteria = FindCriteria::for_tenant(tenant.clone())
///     .with_organization(OrganizationId::parse("org-1").unwrap());
///
/// // Aggregates without an organization are not excluded by the filter
/// let id = AggregateId::generate();
/// assert!(criteria.matches(&Scope::tenant(tenant), &id, false));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindCriteria {
    pub tenant_id: TenantId,
    pub organization_id: Option<OrganizationId>,
    pub department_id: Option<DepartmentId>,
    pub ids: Option<Vec<AggregateId>>,
    pub include_deleted: bool,
}

impl FindCriteria {
    /// Everything live in a tenant
    pub const fn for_tenant(tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
            organization_id: None,
            department_id: None,
            ids: None,
            include_deleted: false,
        }
    }

    /// Criteria narrowed to the context's tenant, organization and department
    pub fn from_context(ctx: &ExecutionContext) -> Self {
        Self {
            organization_id: ctx.organization_id().cloned(),
            department_id: ctx.department_id().cloned(),
            ..Self::for_tenant(ctx.tenant_id().clone())
        }
    }

    #[must_use]
    pub fn with_organization(mut self, organization_id: OrganizationId) -> Self {
        self.organization_id = Some(organization_id);
        self
    }

    #[must_use]
    pub fn with_department(mut self, department_id: DepartmentId) -> Self {
        self.department_id = Some(department_id);
        self
    }

    /// Restrict to the given aggregate ids
    #[must_use]
    pub fn with_ids(mut self, ids: impl IntoIterator<Item = AggregateId>) -> Self {
        self.ids = Some(ids.into_iter().collect());
        self
    }

    /// Also return soft-deleted aggregates
    #[must_use]
    pub const fn including_deleted(mut self) -> Self {
        self.include_deleted = true;
        self
    }

    /// Whether an aggregate with this scope, id and deletion state qualifies
    ///
    /// The tenant must match exactly. Organization and department filters
    /// narrow with AND and only exclude aggregates carrying a different
    /// value. Soft-deleted aggregates are excluded unless `include_deleted`.
    pub fn matches(&self, scope: &Scope, id: &AggregateId, is_deleted: bool) -> bool {
        if !scope.belongs_to_tenant(&self.tenant_id) {
            return false;
        }
        if is_deleted && !self.include_deleted {
            return false;
        }
        if let Some(ids) = &self.ids {
            if !ids.contains(id) {
                return false;
            }
        }
        scope.admits_organization(self.organization_id.as_ref())
            && scope.admits_department(self.department_id.as_ref())
    }

    /// [`FindCriteria::matches`] applied to an aggregate
    pub fn matches_aggregate<T: AggregateRoot>(&self, aggregate: &T) -> bool {
        let core = aggregate.core();
        self.matches(core.scope(), core.id(), core.is_deleted())
    }
}

/// Persistence port for one aggregate type
///
/// `find_by_id` is not scoped; handlers check the loaded aggregate against
/// their context with the scope assertions. `save` is an upsert keyed by the
/// aggregate id and never stores pending events.
#[async_trait]
pub trait Repository<T: AggregateRoot + 'static>: Send + Sync {
    /// Load an aggregate, deleted or not
    async fn find_by_id(&self, id: &AggregateId) -> Result<Option<T>, ApplicationError>;

    /// Load every aggregate matching the criteria
    async fn find_by(&self, criteria: &FindCriteria) -> Result<Vec<T>, ApplicationError>;

    /// Insert or replace an aggregate
    async fn save(&self, aggregate: &T) -> Result<(), ApplicationError>;

    /// Physically remove an aggregate; absent ids are ignored
    async fn delete(&self, id: &AggregateId) -> Result<(), ApplicationError>;
}

/// User persistence with a lookup by natural key
#[async_trait]
pub trait UserRepository: Repository<User> {
    /// Find a user by email within a tenant, including soft-deleted users
    async fn find_by_email(
        &self,
        tenant_id: &TenantId,
        email: &EmailAddress,
    ) -> Result<Option<User>, ApplicationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tenant(id: &str) -> TenantId {
        TenantId::parse(id).unwrap()
    }

    fn org(id: &str) -> OrganizationId {
        OrganizationId::parse(id).unwrap()
    }

    fn dept(id: &str) -> DepartmentId {
        DepartmentId::parse(id).unwrap()
    }

    #[test]
    fn tenant_must_match_exactly() {
        let criteria = FindCriteria::for_tenant(tenant("t1"));
        let id = AggregateId::generate();
        assert!(criteria.matches(&Scope::tenant(tenant("t1")), &id, false));
        assert!(!criteria.matches(&Scope::tenant(tenant("t2")), &id, false));
    }

    #[test]
    fn deleted_excluded_unless_requested() {
        let criteria = FindCriteria::for_tenant(tenant("t1"));
        let scope = Scope::tenant(tenant("t1"));
        let id = AggregateId::generate();

        assert!(!criteria.matches(&scope, &id, true));
        assert!(criteria.including_deleted().matches(&scope, &id, true));
    }

    #[test]
    fn organization_and_department_narrow_with_and() {
        let criteria = FindCriteria::for_tenant(tenant("t1"))
            .with_organization(org("o1"))
            .with_department(dept("d1"));
        let id = AggregateId::generate();

        let exact = Scope::new(tenant("t1"), Some(org("o1")), Some(dept("d1")));
        let unscoped = Scope::tenant(tenant("t1"));
        let other_dept = Scope::new(tenant("t1"), Some(org("o1")), Some(dept("d2")));
        let other_org = Scope::new(tenant("t1"), Some(org("o2")), None);

        assert!(criteria.matches(&exact, &id, false));
        assert!(criteria.matches(&unscoped, &id, false));
        assert!(!criteria.matches(&other_dept, &id, false));
        assert!(!criteria.matches(&other_org, &id, false));
    }

    #[test]
    fn ids_filter_restricts_results() {
        let wanted = AggregateId::generate();
        let criteria = FindCriteria::for_tenant(tenant("t1")).with_ids([wanted]);
        let scope = Scope::tenant(tenant("t1"));

        assert!(criteria.matches(&scope, &wanted, false));
        assert!(!criteria.matches(&scope, &AggregateId::generate(), false));
    }

    #[test]
    fn from_context_copies_narrowing() {
        let ctx = ExecutionContext::new(tenant("t1"), domain::UserId::parse("u1").unwrap())
            .with_organization(org("o1"));
        let criteria = FindCriteria::from_context(&ctx);

        assert_eq!(criteria.tenant_id, tenant("t1"));
        assert_eq!(criteria.organization_id, Some(org("o1")));
        assert!(criteria.department_id.is_none());
        assert!(!criteria.include_deleted);
    }
}
