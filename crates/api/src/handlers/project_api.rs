//! Handlers for the `/api/app` resource.
//!
//! Every successful create, update and delete is recorded in the audit trail
//! with caller `api`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use crowd_core::audit::fields::PROJECT_API;
use crowd_core::audit::{self as audit_core, AuditCaller, LifecycleEvent, Snapshot};
use crowd_core::error::CoreError;
use crowd_core::types::DbId;
use crowd_db::models::project::{CreateProject, Project};
use crowd_db::repositories::ProjectRepo;

use super::{ensure_can_modify, find_project, parse_update, require_non_empty};
use crate::audit;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// POST /api/app
pub async fn create(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(input): Json<CreateProject>,
) -> AppResult<(StatusCode, Json<Project>)> {
    require_non_empty("name", &input.name)?;
    require_non_empty("short_name", &input.short_name)?;
    if let Some(sched) = input.info.as_ref().and_then(|info| info.get("sched")) {
        let name = sched
            .as_str()
            .ok_or_else(|| AppError::BadRequest("sched must be a string".into()))?;
        crowd_core::scheduler::validate(name)?;
    }

    let project = ProjectRepo::create(&state.pool, user.id, &input).await?;
    tracing::info!(app_id = project.id, user_id = user.id, "Project created via API");

    let ctx = audit::context(&project, Some(&user), AuditCaller::Api);
    audit::record_lifecycle(&state.pool, &ctx, LifecycleEvent::Created).await;

    Ok((StatusCode::CREATED, Json(project)))
}

/// GET /api/app/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<Project>> {
    let project = find_project(&state.pool, id).await?;
    Ok(Json(project))
}

/// PUT /api/app/{id}
///
/// Only the keys present in the body are applied and audited; `info` keys are
/// merged into the stored bag.
pub async fn update(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<DbId>,
    Json(payload): Json<Snapshot>,
) -> AppResult<Json<Project>> {
    let before = find_project(&state.pool, id).await?;
    ensure_can_modify(&user, &before)?;

    let input = parse_update(&payload)?;
    if let Some(name) = &input.name {
        require_non_empty("name", name)?;
    }
    if let Some(short_name) = &input.short_name {
        require_non_empty("short_name", short_name)?;
    }

    let after = ProjectRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id,
        }))?;

    let diffs = audit_core::detect(PROJECT_API, &payload, &before.snapshot(), &after.snapshot());
    let ctx = audit::context(&after, Some(&user), AuditCaller::Api);
    audit::record_update(&state.pool, &ctx, &diffs).await;

    Ok(Json(after))
}

/// DELETE /api/app/{id}
pub async fn delete(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let project = find_project(&state.pool, id).await?;
    ensure_can_modify(&user, &project)?;

    if !ProjectRepo::delete(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id,
        }));
    }
    tracing::info!(app_id = id, user_id = user.id, "Project deleted via API");

    let ctx = audit::context(&project, Some(&user), AuditCaller::Api);
    audit::record_lifecycle(&state.pool, &ctx, LifecycleEvent::Deleted).await;

    Ok(StatusCode::NO_CONTENT)
}
