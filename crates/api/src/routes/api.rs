//! Route definitions for the JSON API.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{project_api, task_api};
use crate::state::AppState;

/// JSON API routes mounted at `/api`.
///
/// ```text
/// POST   /app          -> project_api::create
/// GET    /app/{id}     -> project_api::get_by_id
/// PUT    /app/{id}     -> project_api::update
/// DELETE /app/{id}     -> project_api::delete
/// POST   /task         -> task_api::create
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/app", post(project_api::create))
        .route(
            "/app/{id}",
            get(project_api::get_by_id)
                .put(project_api::update)
                .delete(project_api::delete),
        )
        .route("/task", post(task_api::create))
}
