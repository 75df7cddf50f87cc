//! User queries

use async_trait::async_trait;
use domain::{AggregateId, AggregateRoot, UserStatus};
use serde_json::{Value, json};
use tracing::{debug, instrument};

use super::{USER_SUBJECT, UserDto, UserServices};
use crate::{
    ability::AbilityDescriptor,
    error::ApplicationError,
    execution_context::ExecutionContext,
    pipeline::{AuthorizedOperation, ExecutionPipeline, Operation, Query, QueryHandler, assert_scope},
    ports::FindCriteria,
};

/// Fetch one user by id
#[derive(Debug, Clone)]
pub struct GetUserQuery {
    pub context: ExecutionContext,
    pub user_id: AggregateId,
    pub include_deleted: bool,
}

impl GetUserQuery {
    pub const fn new(context: ExecutionContext, user_id: AggregateId) -> Self {
        Self {
            context,
            user_id,
            include_deleted: false,
        }
    }

    #[must_use]
    pub const fn including_deleted(mut self) -> Self {
        self.include_deleted = true;
        self
    }
}

impl Operation for GetUserQuery {
    fn context(&self) -> &ExecutionContext {
        &self.context
    }

    fn operation_name(&self) -> &'static str {
        "users.get"
    }

    fn audit_payload(&self) -> Option<Value> {
        Some(json!({ "user_id": self.user_id, "include_deleted": self.include_deleted }))
    }
}

impl AuthorizedOperation for GetUserQuery {
    fn ability_descriptor(&self) -> AbilityDescriptor {
        AbilityDescriptor::new("read", USER_SUBJECT)
    }
}

impl Query for GetUserQuery {}

#[derive(Debug, Clone)]
pub struct GetUserHandler {
    services: UserServices,
}

impl GetUserHandler {
    pub const fn new(services: UserServices) -> Self {
        Self { services }
    }
}

#[async_trait]
impl QueryHandler for GetUserHandler {
    type Query = GetUserQuery;
    type Output = Option<UserDto>;

    fn pipeline(&self) -> &ExecutionPipeline {
        self.services.pipeline()
    }

    /// Absent and hidden deleted users yield `None`; users of another scope
    /// are a scope violation
    #[instrument(skip(self, query), fields(user_id = %query.user_id))]
    async fn handle(&self, query: &GetUserQuery) -> Result<Option<UserDto>, ApplicationError> {
        let Some(user) = self.services.users().find_by_id(&query.user_id).await? else {
            debug!("User not found");
            return Ok(None);
        };
        assert_scope(&query.context, &user)?;

        if user.is_deleted() && !query.include_deleted {
            debug!("User is deleted");
            return Ok(None);
        }
        Ok(Some(UserDto::from_user(&user)))
    }
}

/// List the users visible in the context's scope
#[derive(Debug, Clone)]
pub struct ListUsersQuery {
    pub context: ExecutionContext,
    pub include_deleted: bool,
    pub status: Option<UserStatus>,
}

impl ListUsersQuery {
    pub const fn new(context: ExecutionContext) -> Self {
        Self {
            context,
            include_deleted: false,
            status: None,
        }
    }

    #[must_use]
    pub const fn including_deleted(mut self) -> Self {
        self.include_deleted = true;
        self
    }

    #[must_use]
    pub const fn with_status(mut self, status: UserStatus) -> Self {
        self.status = Some(status);
        self
    }

    fn criteria(&self) -> FindCriteria {
        let criteria = FindCriteria::from_context(&self.context);
        if self.include_deleted {
            criteria.including_deleted()
        } else {
            criteria
        }
    }
}

impl Operation for ListUsersQuery {
    fn context(&self) -> &ExecutionContext {
        &self.context
    }

    fn operation_name(&self) -> &'static str {
        "users.list"
    }

    fn audit_payload(&self) -> Option<Value> {
        Some(json!({ "include_deleted": self.include_deleted, "status": self.status }))
    }
}

impl AuthorizedOperation for ListUsersQuery {
    fn ability_descriptor(&self) -> AbilityDescriptor {
        AbilityDescriptor::new("read", USER_SUBJECT)
    }
}

impl Query for ListUsersQuery {}

#[derive(Debug, Clone)]
pub struct ListUsersHandler {
    services: UserServices,
}

impl ListUsersHandler {
    pub const fn new(services: UserServices) -> Self {
        Self { services }
    }
}

#[async_trait]
impl QueryHandler for ListUsersHandler {
    type Query = ListUsersQuery;
    type Output = Vec<UserDto>;

    fn pipeline(&self) -> &ExecutionPipeline {
        self.services.pipeline()
    }

    #[instrument(skip(self, query), fields(include_deleted = query.include_deleted))]
    async fn handle(&self, query: &ListUsersQuery) -> Result<Vec<UserDto>, ApplicationError> {
        let users = self.services.users().find_by(&query.criteria()).await?;

        let dtos: Vec<UserDto> = users
            .iter()
            .filter(|user| query.status.is_none_or(|status| user.status() == status))
            .map(UserDto::from_user)
            .collect();

        debug!(count = dtos.len(), "Listed users");
        Ok(dtos)
    }
}
