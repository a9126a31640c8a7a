use axum::{routing::get, Router};

pub mod activities;
pub mod auth;
pub mod organizations;
pub mod system;
pub mod users;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .merge(auth::router())
        .route("/activities", get(activities::list_activities))
        .route("/stats", get(system::stats))
        .nest("/users", users::router())
        .nest("/organizations", organizations::router())
}
