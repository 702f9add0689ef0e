//! Handlers for the `/api/task` resource. Task creation is not audited.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use crowd_core::error::CoreError;
use crowd_db::models::task::{CreateTask, Task};
use crowd_db::repositories::TaskRepo;

use super::{ensure_can_modify, find_project};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// POST /api/task
///
/// Only the owner of the target project (or an admin) may add tasks.
pub async fn create(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(input): Json<CreateTask>,
) -> AppResult<(StatusCode, Json<Task>)> {
    let project = find_project(&state.pool, input.project_id).await?;
    ensure_can_modify(&user, &project)?;

    if let Some(priority) = input.priority_0 {
        if !(0.0..=1.0).contains(&priority) {
            return Err(AppError::Core(CoreError::Validation(
                "priority_0 must be between 0 and 1".into(),
            )));
        }
    }
    if let Some(n_answers) = input.n_answers {
        if n_answers < 1 {
            return Err(AppError::Core(CoreError::Validation(
                "n_answers must be at least 1".into(),
            )));
        }
    }

    let task = TaskRepo::create(&state.pool, &input).await?;
    tracing::info!(task_id = task.id, app_id = project.id, "Task created");
    Ok((StatusCode::CREATED, Json(task)))
}
