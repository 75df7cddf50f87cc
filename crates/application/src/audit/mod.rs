//! Audit recording

mod coordinator;

pub use coordinator::{AuditCoordinator, AuditRequest};
