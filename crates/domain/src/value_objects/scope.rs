//! Multi-tenant scope of an aggregate or a unit of work
//!
//! Every aggregate belongs to exactly one tenant and optionally to an
//! organization and a department inside it.
//!
//! # Examples
//!
//! ```
//! use domain::{OrganizationId, Scope, TenantId};
//!
//! let tenant = TenantId::parse("tenant-1").unwrap();
//! let scope = Scope::tenant(tenant.clone())
//!     .with_organization(OrganizationId::parse("org-1").unwrap());
//!
//! assert!(scope.belongs_to_tenant(&tenant));
//! assert_eq!(scope.organization_id().unwrap().as_str(), "org-1");
//! assert!(scope.department_id().is_none());
//! ```

use serde::{Deserialize, Serialize};

use super::{DepartmentId, OrganizationId, TenantId};

/// Tenant, organization and department an entity lives in
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scope {
    tenant_id: TenantId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    organization_id: Option<OrganizationId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    department_id: Option<DepartmentId>,
}

impl Scope {
    /// A scope covering only a tenant
    pub const fn tenant(tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
            organization_id: None,
            department_id: None,
        }
    }

    /// Build a scope from all three parts
    pub const fn new(
        tenant_id: TenantId,
        organization_id: Option<OrganizationId>,
        department_id: Option<DepartmentId>,
    ) -> Self {
        Self {
            tenant_id,
            organization_id,
            department_id,
        }
    }

    /// Narrow to an organization
    #[must_use]
    pub fn with_organization(mut self, organization_id: OrganizationId) -> Self {
        self.organization_id = Some(organization_id);
        self
    }

    /// Narrow to a department
    #[must_use]
    pub fn with_department(mut self, department_id: DepartmentId) -> Self {
        self.department_id = Some(department_id);
        self
    }

    pub const fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }

    pub const fn organization_id(&self) -> Option<&OrganizationId> {
        self.organization_id.as_ref()
    }

    pub const fn department_id(&self) -> Option<&DepartmentId> {
        self.department_id.as_ref()
    }

    /// Check if this scope belongs to the given tenant
    pub fn belongs_to_tenant(&self, tenant_id: &TenantId) -> bool {
        &self.tenant_id == tenant_id
    }

    /// Whether this scope is compatible with an organization filter
    ///
    /// A missing filter or a scope without organization never conflicts;
    /// only two present, different values do.
    pub fn admits_organization(&self, organization_id: Option<&OrganizationId>) -> bool {
        match (organization_id, self.organization_id.as_ref()) {
            (Some(wanted), Some(actual)) => wanted == actual,
            _ => true,
        }
    }

    /// Whether this scope is compatible with a department filter
    ///
    /// Same narrowing rule as [`Scope::admits_organization`].
    pub fn admits_department(&self, department_id: Option<&DepartmentId>) -> bool {
        match (department_id, self.department_id.as_ref()) {
            (Some(wanted), Some(actual)) => wanted == actual,
            _ => true,
        }
    }
}

/// Anything that lives inside a [`Scope`]
pub trait Scoped {
    fn scope(&self) -> &Scope;

    fn tenant_id(&self) -> &TenantId {
        self.scope().tenant_id()
    }

    /// Check if this entity belongs to the given tenant
    fn belongs_to_tenant(&self, tenant_id: &TenantId) -> bool {
        self.scope().belongs_to_tenant(tenant_id)
    }

    /// Whether the organization and department filters admit this entity
    fn within(
        &self,
        organization_id: Option<&OrganizationId>,
        department_id: Option<&DepartmentId>,
    ) -> bool {
        let scope = self.scope();
        scope.admits_organization(organization_id) && scope.admits_department(department_id)
    }
}

impl From<TenantId> for Scope {
    fn from(tenant_id: TenantId) -> Self {
        Self::tenant(tenant_id)
    }
}
