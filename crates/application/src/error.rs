//! Application-level errors

use std::fmt;

use domain::DomainError;
use thiserror::Error;

/// Errors that can occur in the application layer
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// Domain-level error
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The actor may not perform the action
    #[error("Forbidden: cannot {action} {subject}")]
    Forbidden {
        action: String,
        subject: String,
        reason: Option<String>,
    },

    /// A required collaborator service was never configured
    #[error("Configuration missing: no {0} configured")]
    ConfigurationMissing(&'static str),

    /// Writing to the audit sink failed
    #[error("Audit record failed: {0}")]
    AuditRecord(String),

    /// A loaded aggregate lies outside the caller's scope
    #[error("Scope violation: {0}")]
    ScopeViolation(String),

    /// Storage error
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Publishing domain events failed
    #[error("Event dispatch failed: {0}")]
    EventDispatch(String),

    /// External service error
    #[error("External service error: {0}")]
    ExternalService(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Stable error classes for transports to map onto their status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    Forbidden,
    ConfigurationMissing,
    NotFound,
    Conflict,
    BadRequest,
    AuditFailure,
    Unavailable,
    Internal,
}

impl ErrorKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Forbidden => "forbidden",
            Self::ConfigurationMissing => "configuration_missing",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::BadRequest => "bad_request",
            Self::AuditFailure => "audit_failure",
            Self::Unavailable => "unavailable",
            Self::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ApplicationError {
    /// Create a forbidden error
    pub fn forbidden(
        action: impl Into<String>,
        subject: impl Into<String>,
        reason: Option<String>,
    ) -> Self {
        Self::Forbidden {
            action: action.into(),
            subject: subject.into(),
            reason,
        }
    }

    /// Classify this error
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Domain(err) => match err {
                DomainError::NotFound { .. } => ErrorKind::NotFound,
                DomainError::AlreadyExists { .. } | DomainError::InvalidStateTransition { .. } => {
                    ErrorKind::Conflict
                },
                _ => ErrorKind::Validation,
            },
            Self::Forbidden { .. } => ErrorKind::Forbidden,
            Self::ConfigurationMissing(_) => ErrorKind::ConfigurationMissing,
            Self::AuditRecord(_) => ErrorKind::AuditFailure,
            Self::ScopeViolation(_) => ErrorKind::BadRequest,
            Self::Persistence(_) | Self::EventDispatch(_) | Self::ExternalService(_) => {
                ErrorKind::Unavailable
            },
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Check if this error is retryable
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Persistence(_) | Self::EventDispatch(_) | Self::ExternalService(_)
        )
    }
}
