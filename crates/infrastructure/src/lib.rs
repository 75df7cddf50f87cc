//! Infrastructure layer - Adapters for external systems
//!
//! Implements ports defined in the application layer: in-memory and SQLite
//! storage, the role-policy ability service and the broadcast event
//! dispatcher. Also hosts configuration loading, tracing setup and the
//! composition root.

pub mod adapters;
pub mod config;
pub mod core_services;
pub mod persistence;
pub mod telemetry;

pub use adapters::*;
pub use config::{AbilityAppConfig, AppConfig, AuditAppConfig, AuditBackend, Environment};
pub use core_services::CoreServices;
pub use persistence::{AsyncDatabase, AsyncDatabaseConfig, DatabaseError, SqliteAuditSink};
pub use telemetry::{TelemetryConfig, TelemetryError, init_tracing};
