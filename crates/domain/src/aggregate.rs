//! Aggregate root abstraction
//!
//! An aggregate is the unit of consistency. Its state lives in a concrete
//! type implementing [`AggregateRoot`]; the parts every aggregate shares
//! (identity, scope, audit trail, soft-delete state and the buffer of
//! not-yet-dispatched events) live in an embedded [`AggregateCore`].
//!
//! The event buffer can only be appended to through [`AggregateCore::record_event`]
//! and drained through [`AggregateCore::pull_events`]. It is not safe to share
//! one in-memory aggregate between concurrent units of work; load, mutate and
//! save it under exclusive (`&mut`) ownership.

use crate::{
    errors::DomainError,
    events::{AggregateDeletedEvent, AggregateRestoredEvent, DomainEvent, EventContext, EventPayload},
    value_objects::{AggregateId, AuditTrail, Instant, Scope, Scoped, SoftDeleteStatus, UserId},
};

/// State shared by every aggregate
#[derive(Debug, Clone)]
pub struct AggregateCore {
    id: AggregateId,
    scope: Scope,
    audit_trail: AuditTrail,
    soft_delete: SoftDeleteStatus,
    pending_events: Vec<DomainEvent>,
}

impl AggregateCore {
    /// Core for a brand-new aggregate created by `actor`
    pub fn new(id: AggregateId, scope: Scope, actor: Option<&UserId>) -> Self {
        Self {
            id,
            scope,
            audit_trail: AuditTrail::created(actor.cloned()),
            soft_delete: SoftDeleteStatus::active(),
            pending_events: Vec::new(),
        }
    }

    /// Core for an aggregate loaded from storage; the event buffer starts empty
    pub fn rehydrate(
        id: AggregateId,
        scope: Scope,
        audit_trail: AuditTrail,
        soft_delete: SoftDeleteStatus,
    ) -> Self {
        Self {
            id,
            scope,
            audit_trail,
            soft_delete,
            pending_events: Vec::new(),
        }
    }

    pub const fn id(&self) -> &AggregateId {
        &self.id
    }

    pub const fn scope(&self) -> &Scope {
        &self.scope
    }

    pub const fn audit_trail(&self) -> &AuditTrail {
        &self.audit_trail
    }

    pub const fn soft_delete_status(&self) -> &SoftDeleteStatus {
        &self.soft_delete
    }

    pub const fn is_deleted(&self) -> bool {
        self.soft_delete.is_deleted()
    }

    /// Number of recorded, not yet pulled events
    pub fn pending_event_count(&self) -> usize {
        self.pending_events.len()
    }

    /// Refresh the audit trail for a modification by `actor`
    pub fn touch(&mut self, actor: Option<&UserId>) {
        self.audit_trail = self.audit_trail.update(actor.cloned());
    }

    /// Append an event reflecting the current state
    pub fn record_event<P: EventPayload>(
        &mut self,
        aggregate_type: &'static str,
        actor: Option<&UserId>,
        payload: &P,
    ) -> Result<(), DomainError> {
        let aggregate_id = self.id.to_string();
        let event = DomainEvent::record(
            EventContext {
                aggregate_id: &aggregate_id,
                aggregate_type,
                scope: &self.scope,
                triggered_by: actor,
                audit_trail: &self.audit_trail,
                soft_delete_status: &self.soft_delete,
            },
            payload,
        )?;
        self.pending_events.push(event);
        Ok(())
    }

    /// Drain the event buffer in insertion order
    pub fn pull_events(&mut self) -> Vec<DomainEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Soft-delete; returns `false` without recording anything when already deleted
    pub fn mark_deleted(
        &mut self,
        aggregate_type: &'static str,
        actor: Option<&UserId>,
    ) -> Result<bool, DomainError> {
        if self.soft_delete.is_deleted() {
            return Ok(false);
        }
        let at = Instant::now();
        self.soft_delete = self.soft_delete.clone().mark_deleted_at(actor.cloned(), at);
        self.audit_trail = self.audit_trail.update_at(actor.cloned(), at);
        self.record_event(
            aggregate_type,
            actor,
            &AggregateDeletedEvent {
                deleted_at: at,
                deleted_by: actor.cloned(),
            },
        )?;
        Ok(true)
    }

    /// Undo a soft-delete; returns `false` without recording anything when not deleted
    pub fn restore(
        &mut self,
        aggregate_type: &'static str,
        actor: Option<&UserId>,
    ) -> Result<bool, DomainError> {
        if !self.soft_delete.is_deleted() {
            return Ok(false);
        }
        let at = Instant::now();
        self.soft_delete = self.soft_delete.clone().restore(actor.cloned());
        self.audit_trail = self.audit_trail.update_at(actor.cloned(), at);
        self.record_event(
            aggregate_type,
            actor,
            &AggregateRestoredEvent {
                restored_at: at,
                restored_by: actor.cloned(),
            },
        )?;
        Ok(true)
    }
}

/// The consistency boundary: identity, scope, audit state and pending events
///
/// Every aggregate is [`Scoped`] through its core. Implementors expose their embedded [`AggregateCore`] and check their own
/// invariants in [`AggregateRoot::ensure_valid_state`], which named factory
/// functions call before handing out a new aggregate.
pub trait AggregateRoot: Send + Sync {
    /// Stable type name used in events and error messages
    const AGGREGATE_TYPE: &'static str;

    fn core(&self) -> &AggregateCore;

    fn core_mut(&mut self) -> &mut AggregateCore;

    /// Fail with a domain error when an invariant does not hold
    fn ensure_valid_state(&self) -> Result<(), DomainError>;

    fn id(&self) -> &AggregateId {
        self.core().id()
    }

    fn audit_trail(&self) -> &AuditTrail {
        self.core().audit_trail()
    }

    fn soft_delete_status(&self) -> &SoftDeleteStatus {
        self.core().soft_delete_status()
    }

    fn is_deleted(&self) -> bool {
        self.core().is_deleted()
    }

    /// Drain recorded events; later calls return nothing until new events are recorded
    fn pull_domain_events(&mut self) -> Vec<DomainEvent> {
        self.core_mut().pull_events()
    }

    /// Soft-delete this aggregate, recording `AggregateDeletedEvent` on change
    fn mark_deleted(&mut self, actor: Option<&UserId>) -> Result<bool, DomainError> {
        self.core_mut().mark_deleted(Self::AGGREGATE_TYPE, actor)
    }

    /// Restore this aggregate, recording `AggregateRestoredEvent` on change
    fn restore(&mut self, actor: Option<&UserId>) -> Result<bool, DomainError> {
        self.core_mut().restore(Self::AGGREGATE_TYPE, actor)
    }
}

impl<T: AggregateRoot> Scoped for T {
    fn scope(&self) -> &Scope {
        self.core().scope()
    }
}
