use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use rxconsole_auth::{permissions::ORGANIZATION_ADMINISTRATORS, NewOrganization};
use rxconsole_core::OrganizationId;

use crate::app::{dto, errors, services::AppServices};
use crate::authz;
use crate::context::SessionContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_organizations).post(create_organization))
        .route(
            "/:id",
            get(get_organization)
                .put(update_organization)
                .delete(delete_organization),
        )
}

pub async fn list_organizations(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
) -> axum::response::Response {
    if let Err(res) = authz::authenticated(&services, &session).await {
        return res;
    }
    match services.lifecycle.list_organizations().await {
        Ok(items) => (StatusCode::OK, Json(dto::Items { items })).into_response(),
        Err(e) => errors::account_error_to_response(e),
    }
}

pub async fn create_organization(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
    body: Result<Json<dto::CreateOrganizationRequest>, JsonRejection>,
) -> axum::response::Response {
    let actor = match authz::authorized(&services, &session, &ORGANIZATION_ADMINISTRATORS).await {
        Ok(p) => p,
        Err(res) => return res,
    };
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection(rejection),
    };

    let new = NewOrganization {
        name: body.name,
        kind: body.kind,
    };
    match services.lifecycle.create_organization(&actor, new).await {
        Ok(org) => (StatusCode::CREATED, Json(org)).into_response(),
        Err(e) => errors::account_error_to_response(e),
    }
}

pub async fn get_organization(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: OrganizationId = match errors::parse_id(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };
    if let Err(res) = authz::authenticated(&services, &session).await {
        return res;
    }

    match services.lifecycle.get_organization(id).await {
        Ok(org) => (StatusCode::OK, Json(org)).into_response(),
        Err(e) => errors::account_error_to_response(e),
    }
}

pub async fn update_organization(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<String>,
    body: Result<Json<dto::UpdateOrganizationRequest>, JsonRejection>,
) -> axum::response::Response {
    let id: OrganizationId = match errors::parse_id(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };
    let actor = match authz::authorized(&services, &session, &ORGANIZATION_ADMINISTRATORS).await {
        Ok(p) => p,
        Err(res) => return res,
    };
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection(rejection),
    };

    match services.lifecycle.update_organization(&actor, id, body.into()).await {
        Ok(org) => (StatusCode::OK, Json(org)).into_response(),
        Err(e) => errors::account_error_to_response(e),
    }
}

pub async fn delete_organization(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: OrganizationId = match errors::parse_id(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };
    let actor = match authz::authorized(&services, &session, &ORGANIZATION_ADMINISTRATORS).await {
        Ok(p) => p,
        Err(res) => return res,
    };

    match services.lifecycle.delete_organization(&actor, id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::account_error_to_response(e),
    }
}
