//! Browser form handlers for projects (`/app/...`).
//!
//! Forms answer with a 303 redirect. Successful mutations are recorded in the
//! audit trail with caller `web`.

use axum::extract::{Path, State};
use axum::response::Redirect;
use axum::{Form, Json};
use crowd_core::audit::fields::PROJECT_WEB;
use crowd_core::audit::{self as audit_core, AuditCaller, LifecycleEvent, Snapshot};
use crowd_core::error::CoreError;
use crowd_db::models::project::{CreateProject, Project};
use crowd_db::repositories::ProjectRepo;

use super::{
    ensure_can_modify, find_project_by_short_name, parse_update, require_non_empty,
};
use crate::audit;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::WebUser;
use crate::state::AppState;

fn project_url(short_name: &str) -> String {
    format!("/app/{short_name}")
}

/// POST /app/new
pub async fn create(
    State(state): State<AppState>,
    WebUser(user): WebUser,
    Form(input): Form<CreateProject>,
) -> AppResult<Redirect> {
    require_non_empty("name", &input.name)?;
    require_non_empty("short_name", &input.short_name)?;

    let project = ProjectRepo::create(&state.pool, user.id, &input).await?;
    tracing::info!(app_id = project.id, user_id = user.id, "Project created via web");

    let ctx = audit::context(&project, Some(&user), AuditCaller::Web);
    audit::record_lifecycle(&state.pool, &ctx, LifecycleEvent::Created).await;

    Ok(Redirect::to(&project_url(&project.short_name)))
}

/// GET /app/{short_name}
pub async fn show(
    State(state): State<AppState>,
    Path(short_name): Path<String>,
) -> AppResult<Json<Project>> {
    let project = find_project_by_short_name(&state.pool, &short_name).await?;
    Ok(Json(project))
}

/// POST /app/{short_name}/update
///
/// The settings form posts every field; only the ones whose stored value
/// actually changed are audited. The `info` bag is not editable here.
pub async fn update(
    State(state): State<AppState>,
    WebUser(user): WebUser,
    Path(short_name): Path<String>,
    Form(payload): Form<Snapshot>,
) -> AppResult<Redirect> {
    let before = find_project_by_short_name(&state.pool, &short_name).await?;
    ensure_can_modify(&user, &before)?;

    let fields: Snapshot = payload
        .iter()
        .filter(|(key, _)| key.as_str() != "info")
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    let input = parse_update(&fields)?;
    if let Some(name) = &input.name {
        require_non_empty("name", name)?;
    }
    if let Some(short_name) = &input.short_name {
        require_non_empty("short_name", short_name)?;
    }

    let after = ProjectRepo::update(&state.pool, before.id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id: before.id,
        }))?;

    let diffs = audit_core::detect(PROJECT_WEB, &payload, &before.snapshot(), &after.snapshot());
    let ctx = audit::context(&after, Some(&user), AuditCaller::Web);
    audit::record_update(&state.pool, &ctx, &diffs).await;

    Ok(Redirect::to(&project_url(&after.short_name)))
}

/// POST /app/{short_name}/delete
pub async fn delete(
    State(state): State<AppState>,
    WebUser(user): WebUser,
    Path(short_name): Path<String>,
) -> AppResult<Redirect> {
    let project = find_project_by_short_name(&state.pool, &short_name).await?;
    ensure_can_modify(&user, &project)?;

    if !ProjectRepo::delete(&state.pool, project.id).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id: project.id,
        }));
    }
    tracing::info!(app_id = project.id, user_id = user.id, "Project deleted via web");

    let ctx = audit::context(&project, Some(&user), AuditCaller::Web);
    audit::record_lifecycle(&state.pool, &ctx, LifecycleEvent::Deleted).await;

    Ok(Redirect::to("/"))
}
