//! In-memory repository adapter
//!
//! Keeps clones of saved aggregates in a `RwLock<HashMap>`. Pending events
//! are stripped on save, so loaded aggregates never replay them.

use std::{collections::HashMap, fmt, marker::PhantomData};

use application::{
    error::ApplicationError,
    ports::{FindCriteria, Repository, UserRepository},
};
use async_trait::async_trait;
use domain::{AggregateId, AggregateRoot, EmailAddress, Scoped, TenantId, User};
use parking_lot::RwLock;
use tracing::{debug, instrument};

/// Repository holding aggregates in process memory
pub struct InMemoryRepository<T> {
    rows: RwLock<HashMap<AggregateId, T>>,
    _aggregate: PhantomData<fn() -> T>,
}

impl<T> fmt::Debug for InMemoryRepository<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryRepository")
            .field("len", &self.rows.read().len())
            .finish()
    }
}

impl<T> Default for InMemoryRepository<T> {
    fn default() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
            _aggregate: PhantomData,
        }
    }
}

impl<T> InMemoryRepository<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored aggregates, deleted ones included
    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }
}

#[async_trait]
impl<T> Repository<T> for InMemoryRepository<T>
where
    T: AggregateRoot + Clone + Send + Sync + 'static,
{
    async fn find_by_id(&self, id: &AggregateId) -> Result<Option<T>, ApplicationError> {
        Ok(self.rows.read().get(id).cloned())
    }

    #[instrument(skip(self, criteria), fields(tenant_id = %criteria.tenant_id))]
    async fn find_by(&self, criteria: &FindCriteria) -> Result<Vec<T>, ApplicationError> {
        let mut found: Vec<T> = self
            .rows
            .read()
            .values()
            .filter(|aggregate| criteria.matches_aggregate(*aggregate))
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            a.audit_trail()
                .created_at()
                .cmp(&b.audit_trail().created_at())
                .then_with(|| a.id().cmp(b.id()))
        });

        debug!(count = found.len(), "Found aggregates");
        Ok(found)
    }

    #[instrument(skip(self, aggregate), fields(aggregate_type = T::AGGREGATE_TYPE, id = %aggregate.id()))]
    async fn save(&self, aggregate: &T) -> Result<(), ApplicationError> {
        let mut stored = aggregate.clone();
        stored.pull_domain_events();
        self.rows.write().insert(*aggregate.id(), stored);
        debug!("Saved aggregate");
        Ok(())
    }

    async fn delete(&self, id: &AggregateId) -> Result<(), ApplicationError> {
        self.rows.write().remove(id);
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryRepository<User> {
    async fn find_by_email(
        &self,
        tenant_id: &TenantId,
        email: &EmailAddress,
    ) -> Result<Option<User>, ApplicationError> {
        Ok(self
            .rows
            .read()
            .values()
            .find(|user| user.belongs_to_tenant(tenant_id) && user.email() == email)
            .cloned())
    }
}
