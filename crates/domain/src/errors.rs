//! Domain-level errors

use thiserror::Error;

/// Errors that can occur in the domain layer
///
/// Every variant is raised locally and immediately, at construction or state
/// transition time. None of them are retryable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// Malformed identifier (empty, wrong format, wrong UUID version)
    #[error("Invalid {kind}: {reason}")]
    InvalidIdentifier { kind: &'static str, reason: String },

    /// Timestamp outside the representable range or unparsable
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// Invalid email address format
    #[error("Invalid email address: {0}")]
    InvalidEmailAddress(String),

    /// Invalid username format
    #[error("Invalid username: {0}")]
    InvalidUsername(String),

    /// Validation failed
    #[error("Validation failed: {0}")]
    ValidationError(String),

    /// An aggregate invariant does not hold
    #[error("Invariant violated on {aggregate}: {reason}")]
    InvariantViolation {
        aggregate: &'static str,
        reason: String,
    },

    /// A lifecycle transition is not allowed from the current state
    #[error("Cannot transition {entity_type} from {from} to {to}")]
    InvalidStateTransition {
        entity_type: String,
        from: String,
        to: String,
    },

    /// Entity not found
    #[error("{entity_type} not found: {id}")]
    NotFound { entity_type: String, id: String },

    /// Entity with the same natural key already exists
    #[error("{entity_type} already exists: {key}")]
    AlreadyExists { entity_type: String, key: String },

    /// Event payload could not be encoded or decoded
    #[error("Event payload error: {0}")]
    EventPayload(String),
}

impl DomainError {
    /// Create an invalid identifier error
    pub fn invalid_identifier(kind: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidIdentifier {
            kind,
            reason: reason.into(),
        }
    }

    /// Create an invariant violation error
    pub fn invariant(aggregate: &'static str, reason: impl Into<String>) -> Self {
        Self::InvariantViolation {
            aggregate,
            reason: reason.into(),
        }
    }

    /// Create an invalid state transition error
    pub fn invalid_transition(
        entity_type: impl Into<String>,
        from: impl ToString,
        to: impl ToString,
    ) -> Self {
        Self::InvalidStateTransition {
            entity_type: entity_type.into(),
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// Create a not found error
    pub fn not_found(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }

    /// Create an already exists error
    pub fn already_exists(entity_type: impl Into<String>, key: impl Into<String>) -> Self {
        Self::AlreadyExists {
            entity_type: entity_type.into(),
            key: key.into(),
        }
    }

    /// Whether this error reports a missing entity
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Whether this error reports a conflicting entity
    pub const fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }
}
