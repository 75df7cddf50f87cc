//! User lifecycle status

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state of a user account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
    /// Registered, waiting for activation
    #[default]
    PendingActivation,
    /// Allowed to sign in
    Active,
    /// Blocked by an administrator
    Suspended,
}

impl UserStatus {
    /// Stable wire representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PendingActivation => "PENDING_ACTIVATION",
            Self::Active => "ACTIVE",
            Self::Suspended => "SUSPENDED",
        }
    }

    /// Whether a transition to `next` is permitted
    #[must_use]
    pub const fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::PendingActivation | Self::Suspended, Self::Active)
                | (Self::PendingActivation | Self::Active, Self::Suspended)
        )
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UserStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "PENDING_ACTIVATION" => Ok(Self::PendingActivation),
            "ACTIVE" => Ok(Self::Active),
            "SUSPENDED" => Ok(Self::Suspended),
            other => Err(format!("Unknown user status: {other}")),
        }
    }
}
