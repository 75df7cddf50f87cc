//! Scope assertions for handlers
//!
//! Compare a loaded aggregate against the execution context so a handler
//! never acts across tenants, even when a lookup was not scoped.

use domain::Scoped;

use crate::{error::ApplicationError, execution_context::ExecutionContext};

/// Fail unless `target` belongs to the context's tenant
pub fn assert_tenant_scope<T: Scoped + ?Sized>(
    ctx: &ExecutionContext,
    target: &T,
) -> Result<(), ApplicationError> {
    if target.belongs_to_tenant(ctx.tenant_id()) {
        return Ok(());
    }
    Err(ApplicationError::ScopeViolation(format!(
        "tenant {} does not match context tenant {}",
        target.tenant_id(),
        ctx.tenant_id()
    )))
}

/// Fail when both sides carry different organizations
pub fn assert_organization_scope<T: Scoped + ?Sized>(
    ctx: &ExecutionContext,
    target: &T,
) -> Result<(), ApplicationError> {
    if target.scope().admits_organization(ctx.organization_id()) {
        return Ok(());
    }
    Err(ApplicationError::ScopeViolation(
        "organization does not match context organization".to_string(),
    ))
}

/// Fail when both sides carry different departments
pub fn assert_department_scope<T: Scoped + ?Sized>(
    ctx: &ExecutionContext,
    target: &T,
) -> Result<(), ApplicationError> {
    if target.scope().admits_department(ctx.department_id()) {
        return Ok(());
    }
    Err(ApplicationError::ScopeViolation(
        "department does not match context department".to_string(),
    ))
}

/// Tenant, organization and department assertions together
pub fn assert_scope<T: Scoped + ?Sized>(
    ctx: &ExecutionContext,
    target: &T,
) -> Result<(), ApplicationError> {
    assert_tenant_scope(ctx, target)?;
    assert_organization_scope(ctx, target)?;
    assert_department_scope(ctx, target)
}
