//! User aggregate - An account inside a tenant

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{
    aggregate::{AggregateCore, AggregateRoot},
    errors::DomainError,
    events::{
        UserActivatedEvent, UserCreatedEvent, UserEmailChangedEvent, UserRoleAssignedEvent,
        UserSuspendedEvent,
    },
    value_objects::{
        AggregateId, AuditTrail, EmailAddress, Scope, SoftDeleteStatus, UserId, UserStatus,
        Username,
    },
};

const MAX_DISPLAY_NAME_LEN: usize = 100;
const MAX_ROLE_LEN: usize = 64;

/// A user account
///
/// Created through [`User::register`] in `PENDING_ACTIVATION` state.
#[derive(Debug, Clone)]
pub struct User {
    core: AggregateCore,
    email: EmailAddress,
    username: Username,
    display_name: Option<String>,
    status: UserStatus,
    roles: BTreeSet<String>,
}

/// Flat, storable representation of a [`User`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSnapshot {
    pub id: AggregateId,
    pub scope: Scope,
    pub email: EmailAddress,
    pub username: Username,
    pub display_name: Option<String>,
    pub status: UserStatus,
    pub roles: BTreeSet<String>,
    pub audit_trail: AuditTrail,
    pub soft_delete: SoftDeleteStatus,
}

impl User {
    /// Register a new user and record `UserCreatedEvent`
    pub fn register(
        scope: Scope,
        email: EmailAddress,
        username: Username,
        display_name: Option<String>,
        actor: Option<&UserId>,
    ) -> Result<Self, DomainError> {
        let mut user = Self {
            core: AggregateCore::new(AggregateId::generate(), scope, actor),
            email,
            username,
            display_name: display_name.map(|name| name.trim().to_string()),
            status: UserStatus::PendingActivation,
            roles: BTreeSet::new(),
        };
        user.ensure_valid_state()?;

        let event = UserCreatedEvent {
            email: user.email.clone(),
            username: user.username.clone(),
            status: user.status,
        };
        user.core.record_event(Self::AGGREGATE_TYPE, actor, &event)?;
        Ok(user)
    }

    /// Rebuild a user from storage without recording events
    pub fn restore_from(snapshot: UserSnapshot) -> Result<Self, DomainError> {
        let user = Self {
            core: AggregateCore::rehydrate(
                snapshot.id,
                snapshot.scope,
                snapshot.audit_trail,
                snapshot.soft_delete,
            ),
            email: snapshot.email,
            username: snapshot.username,
            display_name: snapshot.display_name,
            status: snapshot.status,
            roles: snapshot.roles,
        };
        user.ensure_valid_state()?;
        Ok(user)
    }

    /// Capture the persistent state
    pub fn snapshot(&self) -> UserSnapshot {
        UserSnapshot {
            id: *self.core.id(),
            scope: self.core.scope().clone(),
            email: self.email.clone(),
            username: self.username.clone(),
            display_name: self.display_name.clone(),
            status: self.status,
            roles: self.roles.clone(),
            audit_trail: self.core.audit_trail().clone(),
            soft_delete: self.core.soft_delete_status().clone(),
        }
    }

    /// Activate the account
    pub fn activate(&mut self, actor: Option<&UserId>) -> Result<(), DomainError> {
        let previous_status = self.transition_to(UserStatus::Active)?;
        self.core.touch(actor);
        self.core.record_event(
            Self::AGGREGATE_TYPE,
            actor,
            &UserActivatedEvent { previous_status },
        )
    }

    /// Suspend the account
    pub fn suspend(&mut self, reason: Option<String>, actor: Option<&UserId>) -> Result<(), DomainError> {
        let previous_status = self.transition_to(UserStatus::Suspended)?;
        self.core.touch(actor);
        self.core.record_event(
            Self::AGGREGATE_TYPE,
            actor,
            &UserSuspendedEvent {
                previous_status,
                reason,
            },
        )
    }

    /// Change the email address; returns `false` when it is unchanged
    pub fn change_email(&mut self, email: EmailAddress, actor: Option<&UserId>) -> Result<bool, DomainError> {
        self.ensure_not_deleted()?;
        if self.email == email {
            return Ok(false);
        }
        let previous_email = std::mem::replace(&mut self.email, email);
        self.core.touch(actor);
        self.core.record_event(
            Self::AGGREGATE_TYPE,
            actor,
            &UserEmailChangedEvent {
                previous_email,
                email: self.email.clone(),
            },
        )?;
        Ok(true)
    }

    /// Grant a role; returns `false` when the user already holds it
    pub fn assign_role(&mut self, role: &str, actor: Option<&UserId>) -> Result<bool, DomainError> {
        self.ensure_not_deleted()?;
        let role = role.trim();
        validate_role(role)?;
        if !self.roles.insert(role.to_string()) {
            return Ok(false);
        }
        self.core.touch(actor);
        self.core.record_event(
            Self::AGGREGATE_TYPE,
            actor,
            &UserRoleAssignedEvent {
                role: role.to_string(),
            },
        )?;
        Ok(true)
    }

    /// The actor id this user acts under
    pub fn user_id(&self) -> UserId {
        UserId::from(self.core.id())
    }

    pub const fn email(&self) -> &EmailAddress {
        &self.email
    }

    pub const fn username(&self) -> &Username {
        &self.username
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    pub const fn status(&self) -> UserStatus {
        self.status
    }

    pub const fn roles(&self) -> &BTreeSet<String> {
        &self.roles
    }

    fn transition_to(&mut self, next: UserStatus) -> Result<UserStatus, DomainError> {
        self.ensure_not_deleted()?;
        if !self.status.can_transition_to(next) {
            return Err(DomainError::invalid_transition(
                Self::AGGREGATE_TYPE,
                self.status,
                next,
            ));
        }
        Ok(std::mem::replace(&mut self.status, next))
    }

    fn ensure_not_deleted(&self) -> Result<(), DomainError> {
        if self.core.is_deleted() {
            return Err(DomainError::invariant(
                Self::AGGREGATE_TYPE,
                format!("user {} is deleted", self.core.id()),
            ));
        }
        Ok(())
    }
}

fn validate_role(role: &str) -> Result<(), DomainError> {
    if role.is_empty() || role.len() > MAX_ROLE_LEN {
        return Err(DomainError::ValidationError(format!(
            "role must be between 1 and {MAX_ROLE_LEN} characters"
        )));
    }
    Ok(())
}

impl AggregateRoot for User {
    const AGGREGATE_TYPE: &'static str = "User";

    fn core(&self) -> &AggregateCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut AggregateCore {
        &mut self.core
    }

    fn ensure_valid_state(&self) -> Result<(), DomainError> {
        if let Some(name) = &self.display_name {
            if name.is_empty() || name.chars().count() > MAX_DISPLAY_NAME_LEN {
                return Err(DomainError::invariant(
                    Self::AGGREGATE_TYPE,
                    format!("display name must be between 1 and {MAX_DISPLAY_NAME_LEN} characters"),
                ));
            }
        }
        for role in &self.roles {
            validate_role(role)?;
        }
        Ok(())
    }
}
