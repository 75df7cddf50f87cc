//! Persistence module
//!
//! SQLite storage on a shared sqlx pool.

pub mod async_connection;
pub mod audit_log;
pub mod error;
pub mod migrations;

pub use async_connection::{AsyncDatabase, AsyncDatabaseConfig};
pub use audit_log::SqliteAuditSink;
pub use error::DatabaseError;
