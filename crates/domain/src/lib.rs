//! Domain layer for Tenantry
//!
//! Contains identifiers, value objects, domain events, the aggregate root
//! abstraction and the aggregates built on it. This layer performs no I/O and
//! defines the ubiquitous language shared by the application core.

pub mod aggregate;
pub mod entities;
pub mod errors;
pub mod events;
pub mod value_objects;

pub use aggregate::{AggregateCore, AggregateRoot};
pub use entities::*;
pub use errors::DomainError;
pub use events::*;
pub use value_objects::*;
