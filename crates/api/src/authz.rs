//! Request-side authorization gate.
//!
//! The session only proves identity. Every check here re-reads the user so a
//! role change or deletion takes effect on the caller's next request.

use axum::http::StatusCode;
use axum::response::Response;

use rxconsole_auth::{require_role, Principal, RoleSet, User};

use crate::app::{errors, services::AppServices};
use crate::context::SessionContext;

/// The caller's current record. A session whose user has since been deleted
/// counts as unauthenticated.
pub async fn current_user(services: &AppServices, session: &SessionContext) -> Result<User, Response> {
    match services.repo.get_user(session.user_id()).await {
        Ok(Some(user)) => Ok(user),
        Ok(None) => Err(errors::unauthenticated()),
        Err(e) => Err(errors::account_error_to_response(e.into())),
    }
}

pub async fn authenticated(services: &AppServices, session: &SessionContext) -> Result<Principal, Response> {
    current_user(services, session).await.map(|u| Principal::from(&u))
}

/// `authenticated`, then require the current role to be in `allowed`.
pub async fn authorized(
    services: &AppServices,
    session: &SessionContext,
    allowed: &RoleSet,
) -> Result<Principal, Response> {
    let principal = authenticated(services, session).await?;
    if let Err(e) = require_role(&principal, allowed) {
        tracing::info!(user_id = %principal.user_id, role = %principal.role, action = allowed.action(), "forbidden");
        return Err(errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string()));
    }
    Ok(principal)
}
