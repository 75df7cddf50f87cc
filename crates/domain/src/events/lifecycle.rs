//! Soft-delete lifecycle events shared by every aggregate type

use serde::{Deserialize, Serialize};

use super::EventPayload;
use crate::value_objects::{Instant, UserId};

/// An aggregate was soft-deleted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateDeletedEvent {
    pub deleted_at: Instant,
    pub deleted_by: Option<UserId>,
}

impl EventPayload for AggregateDeletedEvent {
    const EVENT_TYPE: &'static str = "AggregateDeletedEvent";
}

/// A soft-deleted aggregate was restored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateRestoredEvent {
    pub restored_at: Instant,
    pub restored_by: Option<UserId>,
}

impl EventPayload for AggregateRestoredEvent {
    const EVENT_TYPE: &'static str = "AggregateRestoredEvent";
}
