use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Extension, Query},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::app::{dto, errors, services::AppServices};
use crate::context::SessionContext;

/// Newest first; `?limit=` defaults to 50 and is capped at 500.
pub async fn list_activities(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
    params: Result<Query<dto::ActivityListParams>, QueryRejection>,
) -> axum::response::Response {
    let Query(params) = match params {
        Ok(p) => p,
        Err(rejection) => return errors::query_rejection(rejection),
    };
    let limit = match params.limit() {
        Ok(l) => l,
        Err(e) => return errors::domain_error_to_response(e),
    };
    if let Err(res) = crate::authz::authenticated(&services, &session).await {
        return res;
    }

    match services.directory.activities(limit).await {
        Ok(items) => (StatusCode::OK, Json(dto::Items { items })).into_response(),
        Err(e) => errors::account_error_to_response(e),
    }
}
