//! Infrastructure adapters
//!
//! Adapters connect application ports to concrete implementations.

mod broadcast_event_dispatcher;
mod in_memory_audit_sink;
mod in_memory_repository;
mod policy_ability_service;

pub use broadcast_event_dispatcher::BroadcastEventDispatcher;
pub use in_memory_audit_sink::InMemoryAuditSink;
pub use in_memory_repository::InMemoryRepository;
pub use policy_ability_service::{PolicyAbilityService, ROLES_METADATA_KEY};
