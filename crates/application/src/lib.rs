//! Application layer - Use cases and orchestration
//!
//! Hosts the command/query pipeline (authorize, handle, audit), the ability
//! and audit coordinators, sagas, and the port definitions infrastructure
//! adapters implement. The user use cases are built on top of these.
//!
//! # Examples
//!
//! ```
//! use application::{Ability, AbilityDescriptor, CapabilityRule, ExecutionContext, FindCriteria};
//! use domain::{TenantId, UserId};
//!
//! let ctx = ExecutionContext::new(
//!     TenantId::parse("tenant-1").unwrap(),
//!     UserId::parse("user-1").unwrap(),
//! );
//! let criteria = FindCriteria::from_context(&ctx);
//! assert_eq!(&criteria.tenant_id, ctx.tenant_id());
//!
//! let ability = Ability::new(vec![CapabilityRule::allow("read", "User")]);
//! assert!(ability.can(&AbilityDescriptor::new("read", "User")));
//! assert!(ability.cannot(&AbilityDescriptor::new("delete", "User")));
//! ```

pub mod ability;
pub mod audit;
pub mod error;
pub mod execution_context;
pub mod pipeline;
pub mod ports;
pub mod saga;
pub mod users;

pub use ability::*;
pub use audit::*;
pub use error::{ApplicationError, ErrorKind};
pub use execution_context::ExecutionContext;
pub use pipeline::*;
pub use ports::*;
pub use saga::*;
pub use users::*;
