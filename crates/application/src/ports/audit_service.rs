//! Audit service ports
//!
//! Sinks either confirm a write immediately or hand back a stream that
//! yields exactly one acknowledgement once the write lands.

use std::fmt;

use async_trait::async_trait;
use domain::{AuditRecord, Instant, TenantId, UserId};
use futures::stream::BoxStream;
#[cfg(test)]
use mockall::automock;

use crate::{error::ApplicationError, execution_context::ExecutionContext};

/// Outcome of [`AuditServicePort::append`]
pub enum AuditAppend {
    /// The record is stored
    Completed,
    /// The record will be stored; the stream emits the single result
    Pending(BoxStream<'static, Result<(), ApplicationError>>),
}

impl fmt::Debug for AuditAppend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => f.write_str("Completed"),
            Self::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

/// Port for audit record storage
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AuditServicePort: Send + Sync {
    /// Store an audit record written on behalf of `ctx`
    async fn append(
        &self,
        ctx: &ExecutionContext,
        record: AuditRecord,
    ) -> Result<AuditAppend, ApplicationError>;
}

/// Criteria for querying audit records
#[derive(Debug, Clone)]
pub struct AuditQuery {
    pub tenant_id: TenantId,
    pub user_id: Option<UserId>,
    pub action: Option<String>,
    pub from: Option<Instant>,
    pub to: Option<Instant>,
    pub limit: Option<u32>,
}

impl AuditQuery {
    /// All records of a tenant, oldest first
    pub const fn for_tenant(tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
            user_id: None,
            action: None,
            from: None,
            to: None,
            limit: None,
        }
    }

    /// Filter by acting user
    #[must_use]
    pub fn with_user(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Filter by operation name
    #[must_use]
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// Filter by time range (inclusive)
    #[must_use]
    pub const fn with_time_range(mut self, from: Instant, to: Instant) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    /// Limit results
    #[must_use]
    pub const fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether a record satisfies every filter except the limit
    pub fn matches(&self, record: &AuditRecord) -> bool {
        record.tenant_id == self.tenant_id
            && self.user_id.as_ref().is_none_or(|u| &record.user_id == u)
            && self.action.as_deref().is_none_or(|a| record.action == a)
            && self.from.is_none_or(|from| !record.recorded_at.is_before(&from))
            && self.to.is_none_or(|to| !record.recorded_at.is_after(&to))
    }
}

/// Read side of an audit sink
#[async_trait]
pub trait AuditReaderPort: Send + Sync {
    /// Records matching `query`, oldest first
    async fn query(&self, query: &AuditQuery) -> Result<Vec<AuditRecord>, ApplicationError>;
}
