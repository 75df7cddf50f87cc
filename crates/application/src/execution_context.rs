//! Execution context for one unit of work
//!
//! Carries the acting user, the tenant scope and free-form metadata through
//! every command and query. It is always passed explicitly.
//!
//! # Examples
//!
//! ```
//! use application::ExecutionContext;
//! use domain::{OrganizationId, TenantId, UserId};
//!
//! let ctx = ExecutionContext::new(
//!     TenantId::parse("tenant-1").unwrap(),
//!     UserId::parse("user-1").unwrap(),
//! )
//! .with_organization(OrganizationId::parse("org-1").unwrap());
//!
//! assert_eq!(ctx.tenant_id().as_str(), "tenant-1");
//! assert_eq!(ctx.organization_id().unwrap().as_str(), "org-1");
//! assert!(!ctx.request_id().is_nil());
//! ```

use std::collections::BTreeMap;

use domain::{DepartmentId, Instant, OrganizationId, Scope, Scoped, TenantId, UserId};
use serde_json::Value;
use uuid::Uuid;

/// Ambient scope of a single command or query
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionContext {
    scope: Scope,
    user_id: UserId,
    request_id: Uuid,
    timestamp: Instant,
    metadata: BTreeMap<String, Value>,
}

impl ExecutionContext {
    /// Create a context for `user_id` acting in `tenant_id`
    ///
    /// Generates a new random request ID and captures the current time.
    #[must_use]
    pub fn new(tenant_id: TenantId, user_id: UserId) -> Self {
        Self {
            scope: Scope::tenant(tenant_id),
            user_id,
            request_id: Uuid::new_v4(),
            timestamp: Instant::now(),
            metadata: BTreeMap::new(),
        }
    }

    /// Narrow to an organization
    #[must_use]
    pub fn with_organization(mut self, organization_id: OrganizationId) -> Self {
        self.scope = self.scope.with_organization(organization_id);
        self
    }

    /// Narrow to a department
    #[must_use]
    pub fn with_department(mut self, department_id: DepartmentId) -> Self {
        self.scope = self.scope.with_department(department_id);
        self
    }

    /// Use a request ID handed in by an upstream service
    #[must_use]
    pub const fn with_request_id(mut self, request_id: Uuid) -> Self {
        self.request_id = request_id;
        self
    }

    /// Attach a metadata entry, replacing any previous value for `key`
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Context for the same tenant and request acting as another user
    ///
    /// Organization, department and metadata are not carried over.
    #[must_use]
    pub fn for_user(&self, user_id: UserId) -> Self {
        Self {
            scope: Scope::tenant(self.scope.tenant_id().clone()),
            user_id,
            request_id: self.request_id,
            timestamp: self.timestamp,
            metadata: BTreeMap::new(),
        }
    }

    pub const fn scope(&self) -> &Scope {
        &self.scope
    }

    pub const fn tenant_id(&self) -> &TenantId {
        self.scope.tenant_id()
    }

    pub const fn organization_id(&self) -> Option<&OrganizationId> {
        self.scope.organization_id()
    }

    pub const fn department_id(&self) -> Option<&DepartmentId> {
        self.scope.department_id()
    }

    pub const fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub const fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub const fn timestamp(&self) -> Instant {
        self.timestamp
    }

    pub const fn metadata(&self) -> &BTreeMap<String, Value> {
        &self.metadata
    }

    pub fn metadata_value(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }
}

impl Scoped for ExecutionContext {
    fn scope(&self) -> &Scope {
        &self.scope
    }
}
