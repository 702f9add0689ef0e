//! Audit interceptor: records completed project mutations.
//!
//! Handlers call into this module only after the mutation has been persisted.
//! Recording never fails the request: every entry is built and saved on its
//! own, and failures are logged and skipped.

use crowd_core::audit::{
    build_lifecycle, build_update, AttributeDiff, AuditCaller, AuditContext, LifecycleEvent,
};
use crowd_db::models::project::Project;
use crowd_db::models::user::User;
use crowd_db::repositories::AuditLogRepo;
use crowd_db::DbPool;

/// Build the audit context for a mutation of `project` by `user`.
///
/// `project` should be the state *after* the mutation so renames are logged
/// under the new short name.
pub fn context(project: &Project, user: Option<&User>, caller: AuditCaller) -> AuditContext {
    AuditContext {
        app_id: project.id,
        app_short_name: project.short_name.clone(),
        actor: user.map(User::actor),
        caller,
    }
}

/// Record a project creation or deletion marker.
pub async fn record_lifecycle(pool: &DbPool, ctx: &AuditContext, event: LifecycleEvent) {
    let entry = build_lifecycle(ctx, event);
    match AuditLogRepo::save(pool, &entry).await {
        Ok(saved) => {
            tracing::info!(
                audit_id = saved.id,
                app_id = ctx.app_id,
                action = %entry.action,
                caller = %ctx.caller,
                "Recorded project lifecycle event",
            );
        }
        Err(e) => {
            tracing::error!(
                error = %e,
                app_id = ctx.app_id,
                action = %entry.action,
                "Failed to record audit entry",
            );
        }
    }
}

/// Record one update entry per diff, in order. Returns how many were saved.
pub async fn record_update(pool: &DbPool, ctx: &AuditContext, diffs: &[AttributeDiff]) -> usize {
    let mut saved = 0;

    for diff in diffs {
        let entry = match build_update(ctx, diff) {
            Ok(Some(entry)) => entry,
            Ok(None) => continue,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    app_id = ctx.app_id,
                    attribute = %diff.attribute,
                    "Failed to build audit entry",
                );
                continue;
            }
        };

        match AuditLogRepo::save(pool, &entry).await {
            Ok(_) => saved += 1,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    app_id = ctx.app_id,
                    attribute = %diff.attribute,
                    "Failed to record audit entry",
                );
            }
        }
    }

    tracing::debug!(
        app_id = ctx.app_id,
        caller = %ctx.caller,
        detected = diffs.len(),
        saved,
        "Recorded project update",
    );
    saved
}
