//! Value Objects - Immutable, identity-less domain primitives

mod aggregate_id;
mod audit_trail;
mod email_address;
mod identifier;
mod instant;
mod scope;
mod soft_delete;
mod user_status;
mod username;

pub use aggregate_id::AggregateId;
pub use audit_trail::AuditTrail;
pub use email_address::EmailAddress;
pub use identifier::{DepartmentId, OrganizationId, TenantId, UserId};
pub use instant::Instant;
pub use scope::{Scope, Scoped};
pub use soft_delete::SoftDeleteStatus;
pub use user_status::UserStatus;
pub use username::Username;
