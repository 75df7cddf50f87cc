//! Broadcast event dispatcher
//!
//! Fans domain events out to every live subscriber over a tokio broadcast
//! channel. Dispatch with no subscribers is not an error; slow subscribers
//! that lag behind the channel capacity miss events.

use application::{error::ApplicationError, ports::EventDispatcherPort};
use async_trait::async_trait;
use domain::DomainEvent;
use tokio::sync::broadcast;
use tracing::{debug, info, instrument};

/// Default number of buffered events per subscriber
const DEFAULT_CAPACITY: usize = 256;

/// Event dispatcher publishing to in-process subscribers
#[derive(Debug, Clone)]
pub struct BroadcastEventDispatcher {
    sender: broadcast::Sender<DomainEvent>,
}

impl Default for BroadcastEventDispatcher {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl BroadcastEventDispatcher {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Receive every event dispatched from now on
    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[async_trait]
impl EventDispatcherPort for BroadcastEventDispatcher {
    #[instrument(skip(self, events), fields(count = events.len()))]
    async fn dispatch(&self, events: Vec<DomainEvent>) -> Result<(), ApplicationError> {
        for event in events {
            info!(
                event_type = event.event_type(),
                aggregate_type = event.aggregate_type(),
                aggregate_id = event.aggregate_id(),
                tenant_id = %event.tenant_id(),
                "Domain event"
            );
            if self.sender.send(event).is_err() {
                debug!("No subscribers for domain event");
            }
        }
        Ok(())
    }
}
