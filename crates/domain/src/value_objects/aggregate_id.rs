//! Aggregate identifier value object

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::{Uuid, Variant, Version};

use crate::errors::DomainError;

const KIND: &str = "aggregate id";

/// Length of the canonical hyphenated UUID representation
const HYPHENATED_LEN: usize = 36;

/// Identity of an aggregate root
///
/// Always an RFC-4122 version 4 UUID in its canonical hyphenated form.
///
/// # Examples
///
/// ```
/// use domain::AggregateId;
///
/// let id = AggregateId::generate();
/// assert_eq!(AggregateId::parse(&id.to_string()).unwrap(), id);
///
/// // Version 1 UUIDs and non-UUID strings are rejected
/// assert!(AggregateId::parse("c232ab00-9414-11ec-b3c8-9f6bdeced846").is_err());
/// assert!(AggregateId::parse("user-1").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AggregateId(Uuid);

impl AggregateId {
    /// Generate a fresh random identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse and validate an identifier
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(DomainError::invalid_identifier(KIND, "must not be empty"));
        }
        if trimmed.len() != HYPHENATED_LEN {
            return Err(DomainError::invalid_identifier(
                KIND,
                format!("'{trimmed}' is not a hyphenated UUID"),
            ));
        }

        let uuid = Uuid::parse_str(trimmed)
            .map_err(|e| DomainError::invalid_identifier(KIND, e.to_string()))?;
        Self::from_uuid(uuid)
    }

    /// Wrap an existing UUID, checking it is a version 4 RFC-4122 UUID
    pub fn from_uuid(uuid: Uuid) -> Result<Self, DomainError> {
        if uuid.get_version() != Some(Version::Random) || uuid.get_variant() != Variant::RFC4122 {
            return Err(DomainError::invalid_identifier(
                KIND,
                format!("'{uuid}' is not a version 4 UUID"),
            ));
        }
        Ok(Self(uuid))
    }

    /// Get the underlying UUID
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for AggregateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AggregateId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for AggregateId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<AggregateId> for String {
    fn from(id: AggregateId) -> Self {
        id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(AggregateId::generate(), AggregateId::generate());
    }

    #[test]
    fn parse_accepts_v4_uuid() {
        let raw = "550e8400-e29b-41d4-a716-446655440000";
        let id = AggregateId::parse(raw).unwrap();
        assert_eq!(id.to_string(), raw);
    }

    #[test]
    fn parse_normalizes_case() {
        let id = AggregateId::parse("550E8400-E29B-41D4-A716-446655440000").unwrap();
        assert_eq!(id.to_string(), "550e8400-e29b-41d4-a716-446655440000");
    }

    #[test]
    fn parse_rejects_empty() {
        let err = AggregateId::parse("  ").unwrap_err();
        assert_eq!(err.to_string(), "Invalid aggregate id: must not be empty");
    }

    #[test]
    fn parse_rejects_non_v4() {
        assert!(AggregateId::parse("c232ab00-9414-11ec-b3c8-9f6bdeced846").is_err());
        assert!(AggregateId::parse("00000000-0000-0000-0000-000000000000").is_err());
    }

    #[test]
    fn parse_rejects_non_hyphenated_forms() {
        assert!(AggregateId::parse("550e8400e29b41d4a716446655440000").is_err());
        assert!(AggregateId::parse("{550e8400-e29b-41d4-a716-446655440000}").is_err());
    }

    #[test]
    fn serde_roundtrip_validates() {
        let id = AggregateId::generate();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(serde_json::from_str::<AggregateId>(&json).unwrap(), id);

        assert!(serde_json::from_str::<AggregateId>("\"not-a-uuid\"").is_err());
    }
}
