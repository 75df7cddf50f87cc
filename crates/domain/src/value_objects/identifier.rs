//! Scope and actor identifier value objects
//!
//! Tenants, organizations, departments and users are identified by opaque
//! strings issued by the identity provider. The only invariant is that the
//! value is non-empty once trimmed.
//!
//! # Examples
//!
//! ```
//! use domain::TenantId;
//!
//! let tenant = TenantId::parse("  tenant-1 ").unwrap();
//! assert_eq!(tenant.as_str(), "tenant-1");
//! assert_eq!(tenant, TenantId::parse("tenant-1").unwrap());
//!
//! assert!(TenantId::parse("   ").is_err());
//! ```

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use super::AggregateId;
use crate::errors::DomainError;

macro_rules! string_identifier {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Parse and validate an identifier, trimming surrounding whitespace
            pub fn parse(value: impl AsRef<str>) -> Result<Self, DomainError> {
                let trimmed = value.as_ref().trim();
                if trimmed.is_empty() {
                    return Err(DomainError::invalid_identifier($label, "must not be empty"));
                }
                Ok(Self(trimmed.to_string()))
            }

            /// Get the identifier as a string slice
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = DomainError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::parse(value)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = DomainError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                Self::parse(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_identifier!(
    /// Identifier of a tenant, the outermost isolation boundary
    TenantId,
    "tenant id"
);

string_identifier!(
    /// Identifier of an organization inside a tenant
    OrganizationId,
    "organization id"
);

string_identifier!(
    /// Identifier of a department inside an organization
    DepartmentId,
    "department id"
);

string_identifier!(
    /// Identifier of an acting user
    UserId,
    "user id"
);

impl From<&AggregateId> for UserId {
    /// Users are aggregates too; their actor id is their aggregate id
    fn from(id: &AggregateId) -> Self {
        Self(id.to_string())
    }
}
