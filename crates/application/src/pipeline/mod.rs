//! Command/query execution pipeline

mod events;
mod execution;
mod handler;
mod operation;
mod scope_guard;

pub use events::publish_events;
pub use execution::{ABILITY_ACTION_KEY, ABILITY_SUBJECT_KEY, ExecutionPipeline};
pub use handler::{CommandHandler, QueryHandler, SystemCommandHandler};
pub use operation::{AuthorizedOperation, Command, Operation, Query};
pub use scope_guard::{
    assert_department_scope, assert_organization_scope, assert_scope, assert_tenant_scope,
};
