//! Username value object

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

const MIN_LEN: usize = 3;
const MAX_LEN: usize = 32;

/// A login handle, unique-looking and URL-safe
///
/// Between 3 and 32 characters drawn from ASCII letters, digits, `_`, `-`
/// and `.`. Case is preserved.
///
/// # Examples
///
/// ```
/// use domain::Username;
///
/// assert!(Username::new("john_doe").is_ok());
/// assert!(Username::new("jd").is_err());
/// assert!(Username::new("john doe").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    /// Create a username, validating length and character set
    pub fn new(value: impl AsRef<str>) -> Result<Self, DomainError> {
        let value = value.as_ref().trim();
        let len = value.chars().count();
        if !(MIN_LEN..=MAX_LEN).contains(&len) {
            return Err(DomainError::InvalidUsername(format!(
                "'{value}' must be between {MIN_LEN} and {MAX_LEN} characters"
            )));
        }
        if let Some(bad) = value
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')))
        {
            return Err(DomainError::InvalidUsername(format!(
                "'{value}' contains forbidden character '{bad}'"
            )));
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Username {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Username> for String {
    fn from(username: Username) -> Self {
        username.0
    }
}
