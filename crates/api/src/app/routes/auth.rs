use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use crate::app::{dto, errors, services::AppServices};
use crate::context::SessionContext;
use crate::middleware::extract_bearer;

/// Endpoints reachable without a session.
pub fn public_router() -> Router {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
}

/// Session-gated self endpoints, merged by [`super::router`].
pub fn router() -> Router {
    Router::new().route("/auth/me", get(me))
}

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::RegisterRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection(rejection),
    };

    match services.authenticator.register(body.into()).await {
        Ok(session) => (StatusCode::CREATED, Json(dto::SessionResponse::from(session))).into_response(),
        Err(e) => errors::account_error_to_response(e),
    }
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::LoginRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection(rejection),
    };

    match services.authenticator.login(&body.username, &body.password).await {
        Ok(session) => (StatusCode::OK, Json(dto::SessionResponse::from(session))).into_response(),
        Err(e) => errors::account_error_to_response(e),
    }
}

/// Always 204: a missing, unknown or already-destroyed session is not an error.
pub async fn logout(
    Extension(services): Extension<Arc<AppServices>>,
    headers: HeaderMap,
) -> axum::response::Response {
    if let Some(token) = extract_bearer(&headers) {
        if let Err(e) = services.authenticator.logout(token).await {
            return errors::account_error_to_response(e);
        }
    }
    StatusCode::NO_CONTENT.into_response()
}

pub async fn me(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
) -> axum::response::Response {
    match crate::authz::current_user(&services, &session).await {
        Ok(user) => (StatusCode::OK, Json(dto::UserResponse::from(user))).into_response(),
        Err(res) => res,
    }
}
