//! Pure authorization checks.
//!
//! - No IO
//! - No panics
//! - No business logic beyond role policy

use thiserror::Error;

use rxconsole_core::{DomainError, OrganizationId};

use crate::{permissions::DIRECTORY_WIDE, Principal, Role, RoleSet, User};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: role {role} may not {action}")]
    RoleNotPermitted { role: Role, action: &'static str },

    #[error("forbidden: cannot assign role {0} at or above your own")]
    Escalation(Role),

    #[error("forbidden: target user ranks at or above you")]
    OutranksActor,

    #[error("forbidden: users can only be placed in your own organization")]
    ForeignOrganization,
}

impl From<AuthzError> for DomainError {
    fn from(err: AuthzError) -> Self {
        DomainError::forbidden(err.to_string())
    }
}

/// Require the principal's current role to be in `allowed`.
pub fn require_role(principal: &Principal, allowed: &RoleSet) -> Result<(), AuthzError> {
    if allowed.contains(principal.role) {
        Ok(())
    } else {
        Err(AuthzError::RoleNotPermitted {
            role: principal.role,
            action: allowed.action(),
        })
    }
}

/// Only SUPER_ADMIN may hand out a role at or above its own rank.
pub fn ensure_can_assign(principal: &Principal, role: Role) -> Result<(), AuthzError> {
    if principal.role == Role::SuperAdmin || role.rank() < principal.role.rank() {
        Ok(())
    } else {
        Err(AuthzError::Escalation(role))
    }
}

/// Only SUPER_ADMIN may modify a user ranked at or above itself.
pub fn ensure_can_manage(principal: &Principal, target_role: Role) -> Result<(), AuthzError> {
    if principal.role == Role::SuperAdmin || target_role.rank() < principal.role.rank() {
        Ok(())
    } else {
        Err(AuthzError::OutranksActor)
    }
}

/// Roles outside [`DIRECTORY_WIDE`] may only place users in their own
/// organization (or none, when they have none themselves).
pub fn ensure_can_place(
    principal: &Principal,
    organization_id: Option<OrganizationId>,
) -> Result<(), AuthzError> {
    if DIRECTORY_WIDE.contains(principal.role) || organization_id == principal.organization_id {
        Ok(())
    } else {
        Err(AuthzError::ForeignOrganization)
    }
}

/// Directory visibility: wide roles see everyone, the rest see their own
/// organization, and a caller without an organization sees only itself.
pub fn can_view(principal: &Principal, user: &User) -> bool {
    if DIRECTORY_WIDE.contains(principal.role) || user.id == principal.user_id {
        return true;
    }
    match principal.organization_id {
        Some(org) => user.organization_id == Some(org),
        None => false,
    }
}
