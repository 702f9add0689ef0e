//! Browser form handlers for a project's task settings
//! (`/app/{short_name}/tasks/...`).
//!
//! Each form changes one setting, records the change in the audit trail with
//! caller `web`, and redirects back to the project page.

use axum::extract::{Path, State};
use axum::response::Redirect;
use axum::Form;
use crowd_core::audit::fields::{
    SCHEDULER_WEB, TASK_PRESENTER_WEB, TASK_PRIORITY, TASK_REDUNDANCY_WEB,
};
use crowd_core::audit::{self as audit_core, AuditCaller, ItemSnapshot, Snapshot};
use crowd_core::error::CoreError;
use crowd_core::types::DbId;
use crowd_db::models::project::Project;
use crowd_db::models::task::Task;
use crowd_db::repositories::{ProjectRepo, TaskRepo};
use serde_json::Value;

use super::{ensure_can_modify, find_project_by_short_name, form_text};
use crate::audit;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::WebUser;
use crate::state::AppState;

/// Accepted range for `n_answers`.
const MIN_ANSWERS: i32 = 1;
const MAX_ANSWERS: i32 = 1000;

// ---------------------------------------------------------------------------
// Task presenter / scheduler (stored in the project `info` bag)
// ---------------------------------------------------------------------------

/// POST /app/{short_name}/tasks/taskpresentereditor
pub async fn task_presenter(
    State(state): State<AppState>,
    WebUser(user): WebUser,
    Path(short_name): Path<String>,
    Form(payload): Form<Snapshot>,
) -> AppResult<Redirect> {
    let project = find_project_by_short_name(&state.pool, &short_name).await?;
    ensure_can_modify(&user, &project)?;

    let editor = form_text(&payload, "editor")?.to_string();
    let after = set_info_key(&state, &project, "task_presenter", Value::String(editor)).await?;

    let diffs = audit_core::detect(
        TASK_PRESENTER_WEB,
        &payload,
        &project.info_map(),
        &after.info_map(),
    );
    let ctx = audit::context(&after, Some(&user), AuditCaller::Web);
    audit::record_update(&state.pool, &ctx, &diffs).await;

    Ok(Redirect::to(&format!("/app/{}", after.short_name)))
}

/// POST /app/{short_name}/tasks/scheduler
pub async fn scheduler(
    State(state): State<AppState>,
    WebUser(user): WebUser,
    Path(short_name): Path<String>,
    Form(payload): Form<Snapshot>,
) -> AppResult<Redirect> {
    let project = find_project_by_short_name(&state.pool, &short_name).await?;
    ensure_can_modify(&user, &project)?;

    let sched = form_text(&payload, "sched")?.trim().to_string();
    crowd_core::scheduler::validate(&sched)?;
    let after = set_info_key(&state, &project, "sched", Value::String(sched)).await?;

    let diffs = audit_core::detect(SCHEDULER_WEB, &payload, &project.info_map(), &after.info_map());
    let ctx = audit::context(&after, Some(&user), AuditCaller::Web);
    audit::record_update(&state.pool, &ctx, &diffs).await;

    Ok(Redirect::to(&format!("/app/{}", after.short_name)))
}

async fn set_info_key(
    state: &AppState,
    project: &Project,
    key: &str,
    value: Value,
) -> AppResult<Project> {
    ProjectRepo::set_info_key(&state.pool, project.id, key, &value)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id: project.id,
        }))
}

// ---------------------------------------------------------------------------
// Priority (per task)
// ---------------------------------------------------------------------------

/// POST /app/{short_name}/tasks/priority
///
/// Form fields: `task_ids` (comma-separated) and `priority_0` in `[0, 1]`.
/// One audit entry is written per task whose priority changed.
pub async fn priority(
    State(state): State<AppState>,
    WebUser(user): WebUser,
    Path(short_name): Path<String>,
    Form(payload): Form<Snapshot>,
) -> AppResult<Redirect> {
    let project = find_project_by_short_name(&state.pool, &short_name).await?;
    ensure_can_modify(&user, &project)?;

    let ids = parse_task_ids(form_text(&payload, "task_ids")?)?;
    let priority = parse_priority(form_text(&payload, "priority_0")?)?;

    let before = TaskRepo::find_by_ids(&state.pool, project.id, &ids).await?;
    if let Some(missing) = ids.iter().find(|id| !before.iter().any(|t| t.id == **id)) {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Task",
            id: *missing,
        }));
    }

    TaskRepo::set_priority(&state.pool, project.id, &ids, priority).await?;
    let after = TaskRepo::find_by_ids(&state.pool, project.id, &ids).await?;

    let items = pair_snapshots(&before, &after);
    let diffs = audit_core::detect_items(&TASK_PRIORITY, &items);
    let ctx = audit::context(&project, Some(&user), AuditCaller::Web);
    audit::record_update(&state.pool, &ctx, &diffs).await;

    Ok(Redirect::to(&format!("/app/{}", project.short_name)))
}

fn parse_task_ids(raw: &str) -> AppResult<Vec<DbId>> {
    let mut ids = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let id: DbId = part
            .parse()
            .map_err(|_| AppError::BadRequest(format!("Invalid task id '{part}'")))?;
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    if ids.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "task_ids must name at least one task".into(),
        )));
    }
    Ok(ids)
}

fn parse_priority(raw: &str) -> AppResult<f64> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid priority '{raw}'")))?;
    if !(0.0..=1.0).contains(&value) {
        return Err(AppError::Core(CoreError::Validation(
            "priority_0 must be between 0 and 1".into(),
        )));
    }
    Ok(value)
}

fn pair_snapshots(before: &[Task], after: &[Task]) -> Vec<ItemSnapshot> {
    before
        .iter()
        .filter_map(|old| {
            let new = after.iter().find(|t| t.id == old.id)?;
            Some(ItemSnapshot {
                id: old.id,
                before: old.snapshot(),
                after: new.snapshot(),
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Redundancy (all tasks)
// ---------------------------------------------------------------------------

/// POST /app/{short_name}/tasks/redundancy
///
/// Sets `n_answers` on every task of the project. Audited as a single
/// `task.n_answers` entry whose old value is the first task's redundancy.
pub async fn redundancy(
    State(state): State<AppState>,
    WebUser(user): WebUser,
    Path(short_name): Path<String>,
    Form(payload): Form<Snapshot>,
) -> AppResult<Redirect> {
    let project = find_project_by_short_name(&state.pool, &short_name).await?;
    ensure_can_modify(&user, &project)?;

    let n_answers = parse_n_answers(form_text(&payload, "n_answers")?)?;

    let tasks = TaskRepo::list_by_project(&state.pool, project.id).await?;
    let Some(first) = tasks.first() else {
        return Err(AppError::Core(CoreError::Validation(
            "Project has no tasks to update".into(),
        )));
    };
    let before = redundancy_snapshot(first.n_answers);

    TaskRepo::set_n_answers(&state.pool, project.id, n_answers).await?;
    let after = redundancy_snapshot(n_answers);

    let diffs = audit_core::detect(TASK_REDUNDANCY_WEB, &payload, &before, &after);
    let ctx = audit::context(&project, Some(&user), AuditCaller::Web);
    audit::record_update(&state.pool, &ctx, &diffs).await;

    Ok(Redirect::to(&format!("/app/{}", project.short_name)))
}

fn parse_n_answers(raw: &str) -> AppResult<i32> {
    let value: i32 = raw
        .trim()
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid redundancy '{raw}'")))?;
    if !(MIN_ANSWERS..=MAX_ANSWERS).contains(&value) {
        return Err(AppError::Core(CoreError::Validation(format!(
            "n_answers must be between {MIN_ANSWERS} and {MAX_ANSWERS}"
        ))));
    }
    Ok(value)
}

fn redundancy_snapshot(n_answers: i32) -> Snapshot {
    let mut snapshot = Snapshot::new();
    snapshot.insert("n_answers".to_string(), Value::from(n_answers));
    snapshot
}
