//! Route definitions for the browser interface.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{account, auditlog, project_web, task_web};
use crate::state::AppState;

/// Browser routes mounted at the root.
///
/// ```text
/// GET  /account/signin                            -> account::sign_in_page
/// POST /account/signin                            -> account::sign_in
///
/// POST /app/new                                   -> project_web::create
/// GET  /app/{short_name}                          -> project_web::show
/// POST /app/{short_name}/update                   -> project_web::update
/// POST /app/{short_name}/delete                   -> project_web::delete
///
/// POST /app/{short_name}/tasks/taskpresentereditor -> task_web::task_presenter
/// POST /app/{short_name}/tasks/scheduler          -> task_web::scheduler
/// POST /app/{short_name}/tasks/priority           -> task_web::priority
/// POST /app/{short_name}/tasks/redundancy         -> task_web::redundancy
///
/// GET  /app/{short_name}/auditlog                 -> auditlog::show
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/account/signin",
            get(account::sign_in_page).post(account::sign_in),
        )
        .route("/app/new", post(project_web::create))
        .route("/app/{short_name}", get(project_web::show))
        .route("/app/{short_name}/update", post(project_web::update))
        .route("/app/{short_name}/delete", post(project_web::delete))
        .route(
            "/app/{short_name}/tasks/taskpresentereditor",
            post(task_web::task_presenter),
        )
        .route("/app/{short_name}/tasks/scheduler", post(task_web::scheduler))
        .route("/app/{short_name}/tasks/priority", post(task_web::priority))
        .route("/app/{short_name}/tasks/redundancy", post(task_web::redundancy))
        .route("/app/{short_name}/auditlog", get(auditlog::show))
}
