//! HTTP handlers.
//!
//! - [`project_api`] / [`task_api`] -- the JSON API (`/api/...`).
//! - [`project_web`] / [`task_web`] -- browser form endpoints (`/app/...`).
//! - [`auditlog`] -- the per-project audit trail viewer.
//! - [`account`] -- sign-in.

pub mod account;
pub mod auditlog;
pub mod project_api;
pub mod project_web;
pub mod task_api;
pub mod task_web;

use crowd_core::access;
use crowd_core::audit::Snapshot;
use crowd_core::error::CoreError;
use crowd_core::types::DbId;
use crowd_db::models::project::{Project, UpdateProject};
use crowd_db::models::user::User;
use crowd_db::repositories::ProjectRepo;
use crowd_db::DbPool;

use crate::auth::password::hash_password;
use crate::error::{AppError, AppResult};

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

pub(crate) async fn find_project(pool: &DbPool, id: DbId) -> AppResult<Project> {
    ProjectRepo::find_by_id(pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id,
        }))
}

pub(crate) async fn find_project_by_short_name(
    pool: &DbPool,
    short_name: &str,
) -> AppResult<Project> {
    ProjectRepo::find_by_short_name(pool, short_name)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFoundByKey {
                entity: "Project",
                key: short_name.to_string(),
            })
        })
}

/// Reject the mutation unless `user` owns `project` or is an admin.
pub(crate) fn ensure_can_modify(user: &User, project: &Project) -> AppResult<()> {
    if access::can_modify(&user.actor(), project.owner_id) {
        Ok(())
    } else {
        tracing::info!(
            user_id = user.id,
            app_id = project.id,
            "Rejected project mutation by non-owner",
        );
        Err(AppError::Core(CoreError::Forbidden(
            "Only the project owner or an admin may change this project".into(),
        )))
    }
}

/// Turn a raw update payload into the typed update, hashing a submitted
/// password and validating the scheduler if one is set.
pub(crate) fn parse_update(payload: &Snapshot) -> AppResult<UpdateProject> {
    let mut update: UpdateProject =
        serde_json::from_value(serde_json::Value::Object(payload.clone()))
            .map_err(|e| AppError::BadRequest(format!("Invalid project payload: {e}")))?;

    if let Some(password) = update.password.as_deref().filter(|p| !p.is_empty()) {
        let hash = hash_password(password)
            .map_err(|e| AppError::InternalError(format!("Password hashing failed: {e}")))?;
        update.passwd_hash = Some(hash);
    }

    if let Some(sched) = update.info.as_ref().and_then(|info| info.get("sched")) {
        let name = sched
            .as_str()
            .ok_or_else(|| CoreError::Validation("sched must be a string".into()))?;
        crowd_core::scheduler::validate(name)?;
    }

    Ok(update)
}

/// Required text field of a form payload.
pub(crate) fn form_text<'a>(payload: &'a Snapshot, key: &str) -> AppResult<&'a str> {
    payload
        .get(key)
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| AppError::BadRequest(format!("Missing form field '{key}'")))
}

pub(crate) fn require_non_empty(field: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(format!(
            "{field} must not be empty"
        ))));
    }
    Ok(())
}
