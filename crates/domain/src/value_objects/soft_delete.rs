//! Soft-delete state value object

use serde::{Deserialize, Serialize};

use super::{Instant, UserId};
use crate::errors::DomainError;

/// Logical deletion state of an aggregate
///
/// Both transitions are idempotent: deleting a deleted status (or restoring
/// an active one) hands back the very same value.
///
/// # Examples
///
/// ```
/// use domain::{SoftDeleteStatus, UserId};
///
/// let admin = UserId::parse("admin").unwrap();
/// let deleted = SoftDeleteStatus::active().mark_deleted(Some(admin.clone()));
/// assert!(deleted.is_deleted());
///
/// let again = deleted.clone().mark_deleted(None);
/// assert_eq!(again, deleted);
///
/// assert!(!deleted.restore(Some(admin)).is_deleted());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SoftDeleteStatus {
    is_deleted: bool,
    deleted_at: Option<Instant>,
    deleted_by: Option<UserId>,
}

impl SoftDeleteStatus {
    /// A status that is not deleted
    pub const fn active() -> Self {
        Self {
            is_deleted: false,
            deleted_at: None,
            deleted_by: None,
        }
    }

    /// Rebuild a status from stored fields
    pub fn from_parts(
        is_deleted: bool,
        deleted_at: Option<Instant>,
        deleted_by: Option<UserId>,
    ) -> Result<Self, DomainError> {
        if !is_deleted && (deleted_at.is_some() || deleted_by.is_some()) {
            return Err(DomainError::ValidationError(
                "active soft-delete status cannot carry deletion details".to_string(),
            ));
        }
        if is_deleted && deleted_at.is_none() {
            return Err(DomainError::ValidationError(
                "deleted soft-delete status requires deleted_at".to_string(),
            ));
        }
        Ok(Self {
            is_deleted,
            deleted_at,
            deleted_by,
        })
    }

    /// Mark as deleted now; a no-op when already deleted
    #[must_use]
    pub fn mark_deleted(self, actor: Option<UserId>) -> Self {
        self.mark_deleted_at(actor, Instant::now())
    }

    /// Mark as deleted at a given instant; a no-op when already deleted
    #[must_use]
    pub fn mark_deleted_at(self, actor: Option<UserId>, at: Instant) -> Self {
        if self.is_deleted {
            return self;
        }
        Self {
            is_deleted: true,
            deleted_at: Some(at),
            deleted_by: actor,
        }
    }

    /// Undo a deletion by `actor`; a no-op when not deleted
    ///
    /// The status carries deletion details only, so the actor is recorded by
    /// the aggregate's audit trail and restore event rather than here.
    #[must_use]
    pub fn restore(self, _actor: Option<UserId>) -> Self {
        if !self.is_deleted {
            return self;
        }
        Self::active()
    }

    pub const fn is_deleted(&self) -> bool {
        self.is_deleted
    }

    pub const fn deleted_at(&self) -> Option<Instant> {
        self.deleted_at
    }

    pub fn deleted_by(&self) -> Option<&UserId> {
        self.deleted_by.as_ref()
    }
}
