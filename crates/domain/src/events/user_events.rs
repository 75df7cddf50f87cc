//! Events emitted by the `User` aggregate

use serde::{Deserialize, Serialize};

use super::EventPayload;
use crate::value_objects::{EmailAddress, UserStatus, Username};

/// A user registered and awaits activation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCreatedEvent {
    pub email: EmailAddress,
    pub username: Username,
    pub status: UserStatus,
}

impl EventPayload for UserCreatedEvent {
    const EVENT_TYPE: &'static str = "UserCreatedEvent";
}

/// A user became active
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserActivatedEvent {
    pub previous_status: UserStatus,
}

impl EventPayload for UserActivatedEvent {
    const EVENT_TYPE: &'static str = "UserActivatedEvent";
}

/// A user was suspended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSuspendedEvent {
    pub previous_status: UserStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl EventPayload for UserSuspendedEvent {
    const EVENT_TYPE: &'static str = "UserSuspendedEvent";
}

/// A user's email address changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserEmailChangedEvent {
    pub previous_email: EmailAddress,
    pub email: EmailAddress,
}

impl EventPayload for UserEmailChangedEvent {
    const EVENT_TYPE: &'static str = "UserEmailChangedEvent";
}

/// A role was granted to a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRoleAssignedEvent {
    pub role: String,
}

impl EventPayload for UserRoleAssignedEvent {
    const EVENT_TYPE: &'static str = "UserRoleAssignedEvent";
}
