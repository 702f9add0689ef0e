//! Building persistable audit entries from diffs and lifecycle events.

use serde::Serialize;

use super::diff::AttributeDiff;
use super::{sentinels, AuditAction, AuditCaller, AuditError, LIFECYCLE_ATTRIBUTE};
use crate::types::{Actor, DbId};

/// Who changed which project, and through which interface.
#[derive(Debug, Clone)]
pub struct AuditContext {
    pub app_id: DbId,
    /// The project's short name *after* the mutation.
    pub app_short_name: String,
    pub actor: Option<Actor>,
    pub caller: AuditCaller,
}

/// Whole-entity events recorded as a single marker entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    Created,
    Deleted,
}

/// An audit entry ready to be inserted. `id` and `created_at` are assigned by
/// the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewAuditEntry {
    pub app_id: DbId,
    pub app_short_name: String,
    pub user_id: Option<DbId>,
    pub user_name: Option<String>,
    pub caller: AuditCaller,
    pub action: AuditAction,
    pub attribute: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

impl AuditContext {
    fn entry(
        &self,
        action: AuditAction,
        attribute: String,
        old_value: Option<String>,
        new_value: Option<String>,
    ) -> NewAuditEntry {
        NewAuditEntry {
            app_id: self.app_id,
            app_short_name: self.app_short_name.clone(),
            user_id: self.actor.as_ref().map(|a| a.id),
            user_name: self.actor.as_ref().map(|a| a.name.clone()),
            caller: self.caller,
            action,
            attribute,
            old_value,
            new_value,
        }
    }
}

/// Build the marker entry for a project creation or deletion.
pub fn build_lifecycle(ctx: &AuditContext, event: LifecycleEvent) -> NewAuditEntry {
    let (action, old, new) = match event {
        LifecycleEvent::Created => (AuditAction::Create, sentinels::NOTHING, sentinels::NEW_PROJECT),
        LifecycleEvent::Deleted => (AuditAction::Delete, sentinels::SAVED, sentinels::DELETED),
    };

    ctx.entry(
        action,
        LIFECYCLE_ATTRIBUTE.to_string(),
        Some(old.to_string()),
        Some(new.to_string()),
    )
}

/// Build the update entry for one diff.
///
/// Returns `Ok(None)` when the diff is not a change. A serialization error
/// only affects this diff.
pub fn build_update(
    ctx: &AuditContext,
    diff: &AttributeDiff,
) -> Result<Option<NewAuditEntry>, AuditError> {
    if !diff.is_change() {
        return Ok(None);
    }

    let old_value = diff.old.to_stored()?;
    let new_value = diff.new.to_stored()?;

    Ok(Some(ctx.entry(
        AuditAction::Update,
        diff.attribute.clone(),
        old_value,
        new_value,
    )))
}
