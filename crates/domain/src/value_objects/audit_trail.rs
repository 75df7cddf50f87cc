//! Creation and modification trail of an aggregate

use serde::{Deserialize, Serialize};

use super::{Instant, UserId};
use crate::errors::DomainError;

/// Who created an aggregate and who touched it last, and when
///
/// The trail is immutable: [`AuditTrail::update`] returns a new value.
///
/// # Examples
///
/// ```
/// use domain::{AuditTrail, UserId};
///
/// let alice = UserId::parse("alice").unwrap();
/// let bob = UserId::parse("bob").unwrap();
///
/// let created = AuditTrail::created(Some(alice.clone()));
/// let updated = created.update(Some(bob.clone()));
///
/// assert_eq!(created.updated_by(), Some(&alice));
/// assert_eq!(updated.updated_by(), Some(&bob));
/// assert_eq!(updated.created_by(), Some(&alice));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditTrail {
    created_at: Instant,
    created_by: Option<UserId>,
    updated_at: Instant,
    updated_by: Option<UserId>,
}

impl AuditTrail {
    /// Start a trail now
    pub fn created(actor: Option<UserId>) -> Self {
        Self::created_on(actor, Instant::now())
    }

    /// Start a trail at a given instant
    pub fn created_on(actor: Option<UserId>, at: Instant) -> Self {
        Self {
            created_at: at,
            created_by: actor.clone(),
            updated_at: at,
            updated_by: actor,
        }
    }

    /// Rebuild a trail from stored fields
    ///
    /// Fails when the last update predates creation.
    pub fn from_parts(
        created_at: Instant,
        created_by: Option<UserId>,
        updated_at: Instant,
        updated_by: Option<UserId>,
    ) -> Result<Self, DomainError> {
        if updated_at.is_before(&created_at) {
            return Err(DomainError::ValidationError(format!(
                "audit trail updated_at {updated_at} precedes created_at {created_at}"
            )));
        }
        Ok(Self {
            created_at,
            created_by,
            updated_at,
            updated_by,
        })
    }

    /// Record a modification now
    #[must_use]
    pub fn update(&self, actor: Option<UserId>) -> Self {
        self.update_at(actor, Instant::now())
    }

    /// Record a modification at a given instant
    ///
    /// The update time never moves before creation.
    #[must_use]
    pub fn update_at(&self, actor: Option<UserId>, at: Instant) -> Self {
        Self {
            created_at: self.created_at,
            created_by: self.created_by.clone(),
            updated_at: at.max(self.created_at),
            updated_by: actor,
        }
    }

    pub const fn created_at(&self) -> Instant {
        self.created_at
    }

    pub fn created_by(&self) -> Option<&UserId> {
        self.created_by.as_ref()
    }

    pub const fn updated_at(&self) -> Instant {
        self.updated_at
    }

    pub fn updated_by(&self) -> Option<&UserId> {
        self.updated_by.as_ref()
    }
}
