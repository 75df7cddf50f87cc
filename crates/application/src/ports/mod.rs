//! Port definitions for application layer
//!
//! Ports are interfaces that define how the application interacts with
//! external systems. Adapters in the infrastructure layer implement these ports.

mod ability_service;
mod audit_service;
mod event_dispatcher;
mod repository;

pub use ability_service::AbilityServicePort;
#[cfg(test)]
pub use ability_service::MockAbilityServicePort;
pub use audit_service::{AuditAppend, AuditQuery, AuditReaderPort, AuditServicePort};
#[cfg(test)]
pub use audit_service::MockAuditServicePort;
pub use event_dispatcher::EventDispatcherPort;
#[cfg(test)]
pub use event_dispatcher::MockEventDispatcherPort;
pub use repository::{FindCriteria, Repository, UserRepository};
