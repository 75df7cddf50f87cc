//! Audit record entity - What an operation did, on whose behalf, in which scope

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::value_objects::{DepartmentId, Instant, OrganizationId, Scope, TenantId, UserId};

/// A single audit log record
///
/// `metadata` is an ordered map so serialized records are stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Auto-incrementing ID (set by persistent sinks)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub recorded_at: Instant,
    pub tenant_id: TenantId,
    pub user_id: UserId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<OrganizationId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department_id: Option<DepartmentId>,
    /// Operation name, e.g. `users.create`
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<Uuid>,
}

impl AuditRecord {
    /// Start a record for `action` performed by `user_id` in `tenant_id`
    pub fn new(tenant_id: TenantId, user_id: UserId, action: impl Into<String>) -> Self {
        Self {
            id: None,
            recorded_at: Instant::now(),
            tenant_id,
            user_id,
            organization_id: None,
            department_id: None,
            action: action.into(),
            payload: None,
            result: None,
            metadata: BTreeMap::new(),
            request_id: None,
        }
    }

    /// Copy organization and department from a scope
    ///
    /// The tenant is not touched.
    #[must_use]
    pub fn with_scope(mut self, scope: &Scope) -> Self {
        self.organization_id = scope.organization_id().cloned();
        self.department_id = scope.department_id().cloned();
        self
    }

    #[must_use]
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    #[must_use]
    pub fn with_result(mut self, result: Value) -> Self {
        self.result = Some(result);
        self
    }

    /// Merge metadata; keys already present are overwritten
    #[must_use]
    pub fn with_metadata(mut self, metadata: impl IntoIterator<Item = (String, Value)>) -> Self {
        self.metadata.extend(metadata);
        self
    }

    /// Set the request ID for tracing correlation
    #[must_use]
    pub const fn with_request_id(mut self, request_id: Uuid) -> Self {
        self.request_id = Some(request_id);
        self
    }

    /// Set the sink-assigned ID
    #[must_use]
    pub const fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }
}
