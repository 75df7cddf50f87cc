//! Domain entities - Objects with identity and lifecycle

mod audit_record;
mod user;

pub use audit_record::AuditRecord;
pub use user::{User, UserSnapshot};
