//! Database migrations
//!
//! Schema changes are embedded as ordered SQL batches. The applied version
//! is tracked in `PRAGMA user_version`, so running the migrations again is a
//! no-op.
//!
//! ## Adding New Migrations
//!
//! 1. Append a `(version, description, sql)` entry to `MIGRATIONS`
//! 2. Versions must be strictly increasing

use sqlx::SqlitePool;
use tracing::{debug, error, info};

use super::error::DatabaseError;

/// Ordered schema migrations
const MIGRATIONS: &[(i64, &str, &str)] = &[(
    1,
    "audit records",
    "CREATE TABLE IF NOT EXISTS audit_records (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        recorded_at INTEGER NOT NULL,
        tenant_id TEXT NOT NULL,
        user_id TEXT NOT NULL,
        organization_id TEXT,
        department_id TEXT,
        action TEXT NOT NULL,
        payload TEXT,
        result TEXT,
        metadata TEXT NOT NULL DEFAULT '{}',
        request_id TEXT
    );
    CREATE INDEX IF NOT EXISTS idx_audit_records_tenant_time
        ON audit_records (tenant_id, recorded_at);
    CREATE INDEX IF NOT EXISTS idx_audit_records_action
        ON audit_records (tenant_id, action);",
)];

/// Latest schema version
pub const SCHEMA_VERSION: i64 = 1;

/// Current schema version of the database
pub async fn schema_version(pool: &SqlitePool) -> Result<i64, DatabaseError> {
    let version: i64 = sqlx::query_scalar("SELECT * FROM pragma_user_version")
        .fetch_one(pool)
        .await?;
    Ok(version)
}

/// Run all pending migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), DatabaseError> {
    let current_version = schema_version(pool).await?;
    if current_version >= SCHEMA_VERSION {
        debug!(version = current_version, "Database schema up to date");
        return Ok(());
    }

    info!(
        from_version = current_version,
        to_version = SCHEMA_VERSION,
        "Running database migrations"
    );

    for &(version, description, sql) in MIGRATIONS {
        if version <= current_version {
            continue;
        }

        let mut tx = pool.begin().await?;
        let applied = async {
            sqlx::raw_sql(sql).execute(&mut *tx).await?;
            // PRAGMA does not accept bound parameters
            sqlx::raw_sql(&format!("PRAGMA user_version = {version}"))
                .execute(&mut *tx)
                .await?;
            Ok::<(), sqlx::Error>(())
        }
        .await;

        if let Err(source) = applied {
            error!(version, description, error = %source, "Migration failed");
            return Err(DatabaseError::Migration { version, source });
        }
        tx.commit().await?;
        debug!(version, description, "Migration applied");
    }

    info!("Database migrations completed");
    Ok(())
}
