//! Shared error mapping for the sqlx persistence layer

use application::error::ApplicationError;
use thiserror::Error;

/// Errors raised while opening or migrating a database
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Migration V{version:03} failed: {source}")]
    Migration {
        version: i64,
        #[source]
        source: sqlx::Error,
    },

    #[error("Stored data is corrupt: {0}")]
    Corrupt(String),
}

impl From<DatabaseError> for ApplicationError {
    fn from(err: DatabaseError) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Map a sqlx error to an application-layer error
pub fn map_sqlx_error(e: sqlx::Error) -> ApplicationError {
    match e {
        sqlx::Error::Database(db_err) => {
            ApplicationError::Persistence(format!("Database error: {db_err}"))
        },
        other => ApplicationError::Persistence(format!("Database error: {other}")),
    }
}
