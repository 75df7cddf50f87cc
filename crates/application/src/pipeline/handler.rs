//! Handler contracts
//!
//! A handler supplies `handle` and the pipeline it runs in; `execute` is the
//! fixed public entry point and should not be overridden.

use async_trait::async_trait;
use serde::Serialize;

use super::{
    execution::ExecutionPipeline,
    operation::{AuthorizedOperation, Command, Query},
};
use crate::error::ApplicationError;

/// Handles one authorized command type
#[async_trait]
pub trait CommandHandler: Send + Sync {
    type Command: Command + AuthorizedOperation + 'static;
    type Output: Serialize + Send + 'static;

    fn pipeline(&self) -> &ExecutionPipeline;

    /// Business logic: load, mutate, save, publish
    async fn handle(&self, command: &Self::Command) -> Result<Self::Output, ApplicationError>;

    /// Authorize, handle, audit and return
    async fn execute(&self, command: Self::Command) -> Result<Self::Output, ApplicationError> {
        self.pipeline()
            .run_authorized(&command, || self.handle(&command))
            .await
    }
}

/// Handles one authorized query type
#[async_trait]
pub trait QueryHandler: Send + Sync {
    type Query: Query + AuthorizedOperation + 'static;
    type Output: Serialize + Send + 'static;

    fn pipeline(&self) -> &ExecutionPipeline;

    async fn handle(&self, query: &Self::Query) -> Result<Self::Output, ApplicationError>;

    /// Authorize, handle, audit and return
    async fn execute(&self, query: Self::Query) -> Result<Self::Output, ApplicationError> {
        self.pipeline()
            .run_authorized(&query, || self.handle(&query))
            .await
    }
}

/// Handles one internal command type that skips authorization
#[async_trait]
pub trait SystemCommandHandler: Send + Sync {
    type Command: Command + 'static;
    type Output: Serialize + Send + 'static;

    fn pipeline(&self) -> &ExecutionPipeline;

    async fn handle(&self, command: &Self::Command) -> Result<Self::Output, ApplicationError>;

    /// Handle, audit and return
    async fn execute(&self, command: Self::Command) -> Result<Self::Output, ApplicationError> {
        self.pipeline()
            .run_unauthorized(&command, || self.handle(&command))
            .await
    }
}
