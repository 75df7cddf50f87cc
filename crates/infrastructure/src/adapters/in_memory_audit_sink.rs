//! In-memory audit sink
//!
//! Stores records synchronously and confirms with `AuditAppend::Completed`.

use application::{
    error::ApplicationError,
    execution_context::ExecutionContext,
    ports::{AuditAppend, AuditQuery, AuditReaderPort, AuditServicePort},
};
use async_trait::async_trait;
use domain::AuditRecord;
use parking_lot::RwLock;
use tracing::{debug, instrument};

/// Audit sink holding records in process memory
#[derive(Debug, Default)]
pub struct InMemoryAuditSink {
    records: RwLock<Vec<AuditRecord>>,
}

impl InMemoryAuditSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored record, oldest first
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.read().clone()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[async_trait]
impl AuditServicePort for InMemoryAuditSink {
    #[instrument(skip(self, _ctx, record), fields(action = %record.action))]
    async fn append(
        &self,
        _ctx: &ExecutionContext,
        record: AuditRecord,
    ) -> Result<AuditAppend, ApplicationError> {
        let mut records = self.records.write();
        let id = i64::try_from(records.len()).unwrap_or(i64::MAX).saturating_add(1);
        records.push(record.with_id(id));
        debug!(id, "Stored audit record");
        Ok(AuditAppend::Completed)
    }
}

#[async_trait]
impl AuditReaderPort for InMemoryAuditSink {
    async fn query(&self, query: &AuditQuery) -> Result<Vec<AuditRecord>, ApplicationError> {
        let records = self.records.read();
        let matching = records.iter().filter(|record| query.matches(record)).cloned();
        Ok(match query.limit {
            Some(limit) => matching.take(limit as usize).collect(),
            None => matching.collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use domain::{TenantId, UserId};

    use super::*;

    fn record(tenant: &str, user: &str, action: &str) -> AuditRecord {
        AuditRecord::new(TenantId::parse(tenant).unwrap(), UserId::parse(user).unwrap(), action)
    }

    fn ctx() -> ExecutionContext {
        ExecutionContext::new(TenantId::parse("t1").unwrap(), UserId::parse("u1").unwrap())
    }

    #[tokio::test]
    async fn append_completes_and_assigns_ids() {
        let sink = InMemoryAuditSink::new();

        let outcome = sink.append(&ctx(), record("t1", "u1", "users.create")).await.unwrap();
        sink.append(&ctx(), record("t1", "u1", "users.activate")).await.unwrap();

        assert!(matches!(outcome, AuditAppend::Completed));
        let ids: Vec<_> = sink.records().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![Some(1), Some(2)]);
    }

    #[tokio::test]
    async fn query_filters_and_limits() {
        let sink = InMemoryAuditSink::new();
        for (tenant, user, action) in [
            ("t1", "u1", "users.create"),
            ("t1", "u2", "users.create"),
            ("t1", "u1", "users.delete"),
            ("t2", "u1", "users.create"),
        ] {
            sink.append(&ctx(), record(tenant, user, action)).await.unwrap();
        }
        let tenant = TenantId::parse("t1").unwrap();

        let all = sink.query(&AuditQuery::for_tenant(tenant.clone())).await.unwrap();
        assert_eq!(all.len(), 3);

        let creates = sink
            .query(&AuditQuery::for_tenant(tenant.clone()).with_action("users.create"))
            .await
            .unwrap();
        assert_eq!(creates.len(), 2);

        let limited = sink
            .query(&AuditQuery::for_tenant(tenant).with_user(UserId::parse("u1").unwrap()).with_limit(1))
            .await
            .unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].action, "users.create");
    }
}
