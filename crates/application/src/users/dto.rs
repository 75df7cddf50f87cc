//! User projection returned by commands and queries

use domain::{AggregateRoot, Instant, Scoped, User, UserStatus};
use serde::{Deserialize, Serialize};

/// Plain view of a [`User`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDto {
    pub id: String,
    pub tenant_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department_id: Option<String>,
    pub email: String,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub status: UserStatus,
    pub roles: Vec<String>,
    pub created_at: Instant,
    pub updated_at: Instant,
    pub is_deleted: bool,
}

impl UserDto {
    /// Project a user; pure and independent of any handler
    pub fn from_user(user: &User) -> Self {
        let scope = user.scope();
        Self {
            id: user.id().to_string(),
            tenant_id: scope.tenant_id().to_string(),
            organization_id: scope.organization_id().map(ToString::to_string),
            department_id: scope.department_id().map(ToString::to_string),
            email: user.email().to_string(),
            username: user.username().to_string(),
            display_name: user.display_name().map(str::to_string),
            status: user.status(),
            roles: user.roles().iter().cloned().collect(),
            created_at: user.audit_trail().created_at(),
            updated_at: user.audit_trail().updated_at(),
            is_deleted: user.is_deleted(),
        }
    }
}

impl From<&User> for UserDto {
    fn from(user: &User) -> Self {
        Self::from_user(user)
    }
}
