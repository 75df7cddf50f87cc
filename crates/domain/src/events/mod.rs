//! Domain events - immutable facts about aggregate state changes

mod domain_event;
mod lifecycle;
mod user_events;

pub use domain_event::{DomainEvent, DomainEventParts, EventContext, EventPayload};
pub use lifecycle::{AggregateDeletedEvent, AggregateRestoredEvent};
pub use user_events::{
    UserActivatedEvent, UserCreatedEvent, UserEmailChangedEvent, UserRoleAssignedEvent,
    UserSuspendedEvent,
};
