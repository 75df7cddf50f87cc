//! Email address value object
//!
//! Addresses are trimmed and lower-cased before validation so that
//! uniqueness checks within a tenant are case-insensitive.
//!
//! # Examples
//!
//! ```
//! use domain::EmailAddress;
//!
//! let email = EmailAddress::new(" User@Example.COM ").unwrap();
//! assert_eq!(email.as_str(), "user@example.com");
//! assert!(EmailAddress::new("invalid").is_err());
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use validator::ValidateEmail;

use crate::errors::DomainError;

/// A validated, normalized email address
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Create a new email address, validating the format
    pub fn new(email: impl AsRef<str>) -> Result<Self, DomainError> {
        let value = email.as_ref().trim().to_lowercase();
        if !value.validate_email() {
            return Err(DomainError::InvalidEmailAddress(value));
        }
        Ok(Self(value))
    }

    /// Get the email address as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get the domain part (after @)
    pub fn domain(&self) -> &str {
        self.0.rsplit_once('@').map_or("", |(_, domain)| domain)
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for EmailAddress {
    type Error = DomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EmailAddress> for String {
    fn from(email: EmailAddress) -> Self {
        email.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_email_is_accepted() {
        let email = EmailAddress::new("user@example.com").unwrap();
        assert_eq!(email.as_str(), "user@example.com");
        assert_eq!(email.domain(), "example.com");
    }

    #[test]
    fn email_is_normalized() {
        let a = EmailAddress::new("  John.Doe@Example.com").unwrap();
        let b = EmailAddress::new("john.doe@example.com").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn invalid_emails_are_rejected() {
        for raw in ["", "plainaddress", "@example.com", "user@", "a b@example.com"] {
            assert!(EmailAddress::new(raw).is_err(), "{raw} should be rejected");
        }
    }

    #[test]
    fn deserialization_validates() {
        assert!(serde_json::from_str::<EmailAddress>("\"nope\"").is_err());
        let email: EmailAddress = serde_json::from_str("\"A@B.io\"").unwrap();
        assert_eq!(email.as_str(), "a@b.io");
    }
}
