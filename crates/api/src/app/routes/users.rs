use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Extension, Path, Query,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use rxconsole_auth::permissions::USER_ADMINISTRATORS;
use rxconsole_core::UserId;
use rxconsole_infra::accounts::UserQuery;

use crate::app::{dto, errors, services::AppServices};
use crate::authz;
use crate::context::SessionContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/:id", get(get_user).put(update_user).delete(delete_user))
        .route("/:id/activities", get(user_activities))
}

pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
    params: Result<Query<dto::UserListParams>, QueryRejection>,
) -> axum::response::Response {
    let Query(params) = match params {
        Ok(p) => p,
        Err(rejection) => return errors::query_rejection(rejection),
    };
    let query = match UserQuery::try_from(params) {
        Ok(q) => q,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let viewer = match authz::authenticated(&services, &session).await {
        Ok(p) => p,
        Err(res) => return res,
    };

    match services.directory.list_users(&viewer, query).await {
        Ok(page) => (StatusCode::OK, Json(page.map(dto::UserResponse::from))).into_response(),
        Err(e) => errors::account_error_to_response(e),
    }
}

pub async fn create_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
    body: Result<Json<dto::CreateUserRequest>, JsonRejection>,
) -> axum::response::Response {
    let actor = match authz::authorized(&services, &session, &USER_ADMINISTRATORS).await {
        Ok(p) => p,
        Err(res) => return res,
    };
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection(rejection),
    };

    match services.lifecycle.create_user(&actor, body.into()).await {
        Ok(user) => (StatusCode::CREATED, Json(dto::UserResponse::from(user))).into_response(),
        Err(e) => errors::account_error_to_response(e),
    }
}

pub async fn get_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: UserId = match errors::parse_id(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };
    let viewer = match authz::authenticated(&services, &session).await {
        Ok(p) => p,
        Err(res) => return res,
    };

    match services.directory.get_user(&viewer, id).await {
        Ok(user) => (StatusCode::OK, Json(dto::UserResponse::from(user))).into_response(),
        Err(e) => errors::account_error_to_response(e),
    }
}

pub async fn update_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<String>,
    body: Result<Json<dto::UpdateUserRequest>, JsonRejection>,
) -> axum::response::Response {
    let id: UserId = match errors::parse_id(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };
    let actor = match authz::authorized(&services, &session, &USER_ADMINISTRATORS).await {
        Ok(p) => p,
        Err(res) => return res,
    };
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection(rejection),
    };

    match services.lifecycle.update_user(&actor, id, body.into()).await {
        Ok(user) => (StatusCode::OK, Json(dto::UserResponse::from(user))).into_response(),
        Err(e) => errors::account_error_to_response(e),
    }
}

pub async fn delete_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: UserId = match errors::parse_id(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };
    let actor = match authz::authorized(&services, &session, &USER_ADMINISTRATORS).await {
        Ok(p) => p,
        Err(res) => return res,
    };

    match services.lifecycle.delete_user(&actor, id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::account_error_to_response(e),
    }
}

pub async fn user_activities(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: UserId = match errors::parse_id(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };
    let viewer = match authz::authenticated(&services, &session).await {
        Ok(p) => p,
        Err(res) => return res,
    };
    if let Err(e) = services.directory.get_user(&viewer, id).await {
        return errors::account_error_to_response(e);
    }

    match services.directory.user_activities(id).await {
        Ok(items) => (StatusCode::OK, Json(dto::Items { items })).into_response(),
        Err(e) => errors::account_error_to_response(e),
    }
}
