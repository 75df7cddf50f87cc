//! Publishing pending domain events

use domain::AggregateRoot;
use tracing::debug;

use crate::{error::ApplicationError, ports::EventDispatcherPort};

/// Drain `aggregate`'s pending events and wait for the dispatcher to take them
///
/// Returns the number of events published.
pub async fn publish_events<T: AggregateRoot>(
    aggregate: &mut T,
    dispatcher: &dyn EventDispatcherPort,
) -> Result<usize, ApplicationError> {
    let events = aggregate.pull_domain_events();
    if events.is_empty() {
        return Ok(0);
    }

    let count = events.len();
    dispatcher.dispatch(events).await?;
    debug!(aggregate_id = %aggregate.id(), count, "Published domain events");
    Ok(count)
}
