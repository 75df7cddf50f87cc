//! Domain event envelope
//!
//! An event carries the full tenant, audit and soft-delete context of the
//! aggregate at the moment it was recorded, plus a typed payload encoded as
//! JSON. Events never change after construction.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    errors::DomainError,
    value_objects::{
        AuditTrail, DepartmentId, Instant, OrganizationId, Scope, SoftDeleteStatus, TenantId,
        UserId,
    },
};

/// Typed body of a domain event
///
/// `EVENT_TYPE` is the stable name subscribers route on.
pub trait EventPayload: Serialize + DeserializeOwned {
    const EVENT_TYPE: &'static str;
}

/// An immutable fact about an aggregate state change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DomainEventParts")]
pub struct DomainEvent {
    event_id: Uuid,
    occurred_at: Instant,
    aggregate_id: String,
    aggregate_type: String,
    event_type: String,
    tenant_id: TenantId,
    #[serde(skip_serializing_if = "Option::is_none")]
    organization_id: Option<OrganizationId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    department_id: Option<DepartmentId>,
    triggered_by: Option<UserId>,
    audit_metadata: AuditTrail,
    soft_delete_status: SoftDeleteStatus,
    payload: Value,
}

/// Unvalidated event fields, as received from storage or a broker
#[derive(Debug, Clone, Deserialize)]
pub struct DomainEventParts {
    pub event_id: String,
    pub occurred_at: Instant,
    pub aggregate_id: String,
    pub aggregate_type: String,
    pub event_type: String,
    pub tenant_id: TenantId,
    #[serde(default)]
    pub organization_id: Option<OrganizationId>,
    #[serde(default)]
    pub department_id: Option<DepartmentId>,
    #[serde(default)]
    pub triggered_by: Option<UserId>,
    pub audit_metadata: AuditTrail,
    pub soft_delete_status: SoftDeleteStatus,
    pub payload: Value,
}

/// Aggregate state captured into an event at record time
#[derive(Debug, Clone, Copy)]
pub struct EventContext<'a> {
    pub aggregate_id: &'a str,
    pub aggregate_type: &'static str,
    pub scope: &'a Scope,
    pub triggered_by: Option<&'a UserId>,
    pub audit_trail: &'a AuditTrail,
    pub soft_delete_status: &'a SoftDeleteStatus,
}

impl DomainEvent {
    /// Record a new event for an aggregate
    pub fn record<P: EventPayload>(context: EventContext<'_>, payload: &P) -> Result<Self, DomainError> {
        let payload = serde_json::to_value(payload)
            .map_err(|e| DomainError::EventPayload(format!("{}: {e}", P::EVENT_TYPE)))?;

        Self::from_parts(DomainEventParts {
            event_id: Uuid::new_v4().to_string(),
            occurred_at: Instant::now(),
            aggregate_id: context.aggregate_id.to_string(),
            aggregate_type: context.aggregate_type.to_string(),
            event_type: P::EVENT_TYPE.to_string(),
            tenant_id: context.scope.tenant_id().clone(),
            organization_id: context.scope.organization_id().cloned(),
            department_id: context.scope.department_id().cloned(),
            triggered_by: context.triggered_by.cloned(),
            audit_metadata: context.audit_trail.clone(),
            soft_delete_status: context.soft_delete_status.clone(),
            payload,
        })
    }

    /// Validate raw parts into an event
    ///
    /// Fails when `event_id` is not a UUID or `aggregate_id` is blank.
    pub fn from_parts(parts: DomainEventParts) -> Result<Self, DomainError> {
        let event_id = Uuid::parse_str(parts.event_id.trim())
            .map_err(|e| DomainError::invalid_identifier("event id", e.to_string()))?;
        let aggregate_id = parts.aggregate_id.trim();
        if aggregate_id.is_empty() {
            return Err(DomainError::invalid_identifier(
                "aggregate id",
                "domain events require a non-empty aggregate id",
            ));
        }
        if parts.event_type.trim().is_empty() {
            return Err(DomainError::ValidationError(
                "domain events require an event type".to_string(),
            ));
        }

        Ok(Self {
            event_id,
            occurred_at: parts.occurred_at,
            aggregate_id: aggregate_id.to_string(),
            aggregate_type: parts.aggregate_type,
            event_type: parts.event_type,
            tenant_id: parts.tenant_id,
            organization_id: parts.organization_id,
            department_id: parts.department_id,
            triggered_by: parts.triggered_by,
            audit_metadata: parts.audit_metadata,
            soft_delete_status: parts.soft_delete_status,
            payload: parts.payload,
        })
    }

    /// Decode the payload as a concrete event type
    ///
    /// Fails when the event type name does not match `P::EVENT_TYPE`.
    pub fn payload_as<P: EventPayload>(&self) -> Result<P, DomainError> {
        if !self.is::<P>() {
            return Err(DomainError::EventPayload(format!(
                "expected {} but event is {}",
                P::EVENT_TYPE,
                self.event_type
            )));
        }
        serde_json::from_value(self.payload.clone())
            .map_err(|e| DomainError::EventPayload(format!("{}: {e}", P::EVENT_TYPE)))
    }

    /// Whether this event carries a `P` payload
    pub fn is<P: EventPayload>(&self) -> bool {
        self.event_type == P::EVENT_TYPE
    }

    pub const fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub const fn occurred_at(&self) -> Instant {
        self.occurred_at
    }

    pub fn aggregate_id(&self) -> &str {
        &self.aggregate_id
    }

    pub fn aggregate_type(&self) -> &str {
        &self.aggregate_type
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
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

    pub const fn triggered_by(&self) -> Option<&UserId> {
        self.triggered_by.as_ref()
    }

    pub const fn audit_metadata(&self) -> &AuditTrail {
        &self.audit_metadata
    }

    pub const fn soft_delete_status(&self) -> &SoftDeleteStatus {
        &self.soft_delete_status
    }

    pub const fn payload(&self) -> &Value {
        &self.payload
    }
}

impl TryFrom<DomainEventParts> for DomainEvent {
    type Error = DomainError;

    fn try_from(parts: DomainEventParts) -> Result<Self, Self::Error> {
        Self::from_parts(parts)
    }
}
