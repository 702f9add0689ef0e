pub mod api;
pub mod health;
pub mod web;

use axum::Router;

use crate::state::AppState;

/// Build the full route tree (without middleware).
///
/// ```text
/// /health          service health
/// /api/...         JSON API (see [`api::router`])
/// /account/...     sign-in (see [`web::router`])
/// /app/...         browser forms and the audit log viewer
/// ```
pub fn app_routes() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .nest("/api", api::router())
        .merge(web::router())
}
