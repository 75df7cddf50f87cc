//! Domain event dispatcher port

use async_trait::async_trait;
use domain::DomainEvent;
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// Port for publishing domain events to subscribers
#[cfg_attr(test, automock)]
#[async_trait]
pub trait EventDispatcherPort: Send + Sync {
    /// Publish events in order; returns once they are handed off
    async fn dispatch(&self, events: Vec<DomainEvent>) -> Result<(), ApplicationError>;
}
