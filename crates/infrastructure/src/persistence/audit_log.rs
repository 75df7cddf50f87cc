//! SQLite audit sink
//!
//! Implements `AuditServicePort` and `AuditReaderPort` on the shared sqlx
//! pool. Appends are acknowledged through a single-emission stream that
//! resolves once the insert lands.

use std::collections::BTreeMap;

use application::{
    error::ApplicationError,
    execution_context::ExecutionContext,
    ports::{AuditAppend, AuditQuery, AuditReaderPort, AuditServicePort},
};
use async_trait::async_trait;
use domain::{AuditRecord, DepartmentId, Instant, OrganizationId, TenantId, UserId};
use futures::{StreamExt, stream};
use serde_json::Value;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, instrument};
use uuid::Uuid;

use super::error::{DatabaseError, map_sqlx_error};

const SELECT_COLUMNS: &str = "SELECT id, recorded_at, tenant_id, user_id, organization_id, \
     department_id, action, payload, result, metadata, request_id FROM audit_records";

/// SQLite-backed audit sink
#[derive(Debug, Clone)]
pub struct SqliteAuditSink {
    pool: SqlitePool,
}

impl SqliteAuditSink {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn insert(pool: SqlitePool, record: AuditRecord) -> Result<(), ApplicationError> {
        let payload = record.payload.as_ref().map(Value::to_string);
        let result = record.result.as_ref().map(Value::to_string);
        let metadata = serde_json::to_string(&record.metadata)
            .map_err(|e| ApplicationError::Internal(format!("Unserializable audit metadata: {e}")))?;

        sqlx::query(
            "INSERT INTO audit_records (recorded_at, tenant_id, user_id, organization_id, \
             department_id, action, payload, result, metadata, request_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(record.recorded_at.timestamp_millis())
        .bind(record.tenant_id.as_str())
        .bind(record.user_id.as_str())
        .bind(record.organization_id.as_ref().map(OrganizationId::as_str))
        .bind(record.department_id.as_ref().map(DepartmentId::as_str))
        .bind(&record.action)
        .bind(payload)
        .bind(result)
        .bind(metadata)
        .bind(record.request_id.map(|id| id.to_string()))
        .execute(&pool)
        .await
        .map_err(map_sqlx_error)?;

        debug!(action = %record.action, "Stored audit record");
        Ok(())
    }
}

/// Row type for audit record queries
#[derive(sqlx::FromRow)]
struct AuditRow {
    id: i64,
    recorded_at: i64,
    tenant_id: String,
    user_id: String,
    organization_id: Option<String>,
    department_id: Option<String>,
    action: String,
    payload: Option<String>,
    result: Option<String>,
    metadata: String,
    request_id: Option<String>,
}

impl AuditRow {
    fn into_record(self) -> Result<AuditRecord, DatabaseError> {
        let corrupt = |e: &dyn std::fmt::Display| DatabaseError::Corrupt(format!("audit record {}: {e}", self.id));

        let recorded_at = Instant::from_timestamp_millis(self.recorded_at).map_err(|e| corrupt(&e))?;
        let tenant_id = TenantId::parse(&self.tenant_id).map_err(|e| corrupt(&e))?;
        let user_id = UserId::parse(&self.user_id).map_err(|e| corrupt(&e))?;
        let organization_id = self
            .organization_id
            .as_deref()
            .map(OrganizationId::parse)
            .transpose()
            .map_err(|e| corrupt(&e))?;
        let department_id = self
            .department_id
            .as_deref()
            .map(DepartmentId::parse)
            .transpose()
            .map_err(|e| corrupt(&e))?;
        let payload = parse_json(self.payload.as_deref()).map_err(|e| corrupt(&e))?;
        let result = parse_json(self.result.as_deref()).map_err(|e| corrupt(&e))?;
        let metadata: BTreeMap<String, Value> =
            serde_json::from_str(&self.metadata).map_err(|e| corrupt(&e))?;
        let request_id = self
            .request_id
            .as_deref()
            .map(Uuid::parse_str)
            .transpose()
            .map_err(|e| corrupt(&e))?;

        Ok(AuditRecord {
            id: Some(self.id),
            recorded_at,
            tenant_id,
            user_id,
            organization_id,
            department_id,
            action: self.action,
            payload,
            result,
            metadata,
            request_id,
        })
    }
}

fn parse_json(raw: Option<&str>) -> Result<Option<Value>, serde_json::Error> {
    raw.map(serde_json::from_str).transpose()
}

#[async_trait]
impl AuditServicePort for SqliteAuditSink {
    #[instrument(skip(self, _ctx, record), fields(action = %record.action))]
    async fn append(
        &self,
        _ctx: &ExecutionContext,
        record: AuditRecord,
    ) -> Result<AuditAppend, ApplicationError> {
        let pool = self.pool.clone();
        let ack = stream::once(Self::insert(pool, record)).boxed();
        Ok(AuditAppend::Pending(ack))
    }
}

#[async_trait]
impl AuditReaderPort for SqliteAuditSink {
    #[instrument(skip(self, query), fields(tenant_id = %query.tenant_id))]
    async fn query(&self, query: &AuditQuery) -> Result<Vec<AuditRecord>, ApplicationError> {
        let mut sql = QueryBuilder::<Sqlite>::new(SELECT_COLUMNS);
        sql.push(" WHERE tenant_id = ").push_bind(query.tenant_id.as_str());

        if let Some(user_id) = &query.user_id {
            sql.push(" AND user_id = ").push_bind(user_id.as_str());
        }
        if let Some(action) = &query.action {
            sql.push(" AND action = ").push_bind(action.as_str());
        }
        if let Some(from) = query.from {
            sql.push(" AND recorded_at >= ").push_bind(from.timestamp_millis());
        }
        if let Some(to) = query.to {
            sql.push(" AND recorded_at <= ").push_bind(to.timestamp_millis());
        }

        sql.push(" ORDER BY recorded_at ASC, id ASC");

        if let Some(limit) = query.limit {
            sql.push(" LIMIT ").push_bind(i64::from(limit));
        }

        let rows: Vec<AuditRow> = sql
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        let records = rows
            .into_iter()
            .map(AuditRow::into_record)
            .collect::<Result<Vec<_>, _>>()?;
        debug!(count = records.len(), "Queried audit records");
        Ok(records)
    }
}
