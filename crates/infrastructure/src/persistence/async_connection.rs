//! Async database connection using sqlx
//!
//! Every SQLite-backed adapter shares this pool.

use std::{path::Path, str::FromStr};

use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use tracing::{debug, info, instrument};

use super::{error::DatabaseError, migrations};

/// Configuration for async database connection
#[derive(Debug, Clone)]
pub struct AsyncDatabaseConfig {
    /// Database URL (e.g., "sqlite:tenantry.db" or "sqlite::memory:")
    pub url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of connections to keep open
    pub min_connections: u32,
    /// Enable WAL mode for better concurrency
    pub wal_mode: bool,
}

impl Default for AsyncDatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:tenantry.db".to_string(),
            max_connections: 5,
            min_connections: 1,
            wal_mode: true,
        }
    }
}

impl AsyncDatabaseConfig {
    /// In-memory database configuration for testing
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            // Each connection would otherwise get its own empty database
            max_connections: 1,
            min_connections: 1,
            wal_mode: false,
        }
    }

    /// File-based database configuration
    #[must_use]
    pub fn file(path: impl AsRef<Path>) -> Self {
        Self {
            url: format!("sqlite:{}", path.as_ref().display()),
            ..Default::default()
        }
    }

    /// Configuration for a database URL
    #[must_use]
    pub fn url(url: impl Into<String>) -> Self {
        let url = url.into();
        if url.contains(":memory:") {
            return Self { url, ..Self::in_memory() };
        }
        Self {
            url,
            ..Default::default()
        }
    }

    /// Whether the URL names a private in-memory database
    pub fn is_in_memory(&self) -> bool {
        self.url.contains(":memory:")
    }
}

/// Async database connection pool
#[derive(Debug, Clone)]
pub struct AsyncDatabase {
    pool: SqlitePool,
}

impl AsyncDatabase {
    /// Create a new async database connection pool
    #[instrument(skip_all, fields(url = %config.url))]
    pub async fn new(config: &AsyncDatabaseConfig) -> Result<Self, DatabaseError> {
        let options = SqliteConnectOptions::from_str(&config.url)?.create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect_with(options)
            .await?;

        if config.wal_mode && !config.is_in_memory() {
            sqlx::query("PRAGMA journal_mode=WAL").execute(&pool).await?;
            sqlx::query("PRAGMA synchronous=NORMAL").execute(&pool).await?;
            debug!("WAL mode enabled");
        }

        sqlx::query("PRAGMA busy_timeout=5000").execute(&pool).await?;

        info!(
            max_connections = config.max_connections,
            "Async database pool created"
        );

        Ok(Self { pool })
    }

    /// Create an in-memory database for testing
    pub async fn in_memory() -> Result<Self, DatabaseError> {
        Self::new(&AsyncDatabaseConfig::in_memory()).await
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Bring the schema up to date
    #[instrument(skip(self))]
    pub async fn migrate(&self) -> Result<(), DatabaseError> {
        migrations::run_migrations(&self.pool).await
    }

    /// Close all connections in the pool
    pub async fn close(&self) {
        self.pool.close().await;
        debug!("Database pool closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn migrations_create_audit_table() {
        let db = AsyncDatabase::in_memory().await.unwrap();
        db.migrate().await.unwrap();

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM audit_records")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count.0, 0);
        assert_eq!(
            migrations::schema_version(db.pool()).await.unwrap(),
            migrations::SCHEMA_VERSION
        );
    }

    #[tokio::test]
    async fn migrations_are_idempotent() {
        let db = AsyncDatabase::in_memory().await.unwrap();
        db.migrate().await.unwrap();
        db.migrate().await.unwrap();
    }

    #[tokio::test]
    async fn wal_mode_for_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let config = AsyncDatabaseConfig::file(dir.path().join("wal.db"));
        let db = AsyncDatabase::new(&config).await.unwrap();

        let mode: (String,) = sqlx::query_as("PRAGMA journal_mode")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(mode.0.to_lowercase(), "wal");
        db.close().await;
    }

    #[test]
    fn url_detects_in_memory_databases() {
        let config = AsyncDatabaseConfig::url("sqlite::memory:");
        assert_eq!(config.max_connections, 1);
        assert!(!config.wal_mode);

        let config = AsyncDatabaseConfig::url("sqlite:audit.db");
        assert_eq!(config.max_connections, 5);
        assert!(config.wal_mode);
    }
}
