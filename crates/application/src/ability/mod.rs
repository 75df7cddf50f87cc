//! Capability-based authorization

mod capability;
mod coordinator;

pub use capability::{ALL, Ability, AbilityDescriptor, CapabilityRule, MANAGE};
pub use coordinator::AbilityCoordinator;
