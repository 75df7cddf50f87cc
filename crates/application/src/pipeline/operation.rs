//! Command and query contracts

use serde_json::Value;

use crate::{ability::AbilityDescriptor, execution_context::ExecutionContext};

/// Anything run through the pipeline
pub trait Operation: Send + Sync {
    /// The unit of work this operation runs in
    fn context(&self) -> &ExecutionContext;

    /// Stable name, recorded as the audit action
    fn operation_name(&self) -> &'static str;

    /// Input worth keeping in the audit record
    fn audit_payload(&self) -> Option<Value> {
        None
    }
}

/// An operation gated by an ability check
pub trait AuthorizedOperation: Operation {
    fn ability_descriptor(&self) -> AbilityDescriptor;
}

/// Marker for state-changing operations
pub trait Command: Operation {}

/// Marker for read-only operations
pub trait Query: Operation {}
