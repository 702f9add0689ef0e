//! Project entity model and DTOs.

use crowd_core::audit::Snapshot;
use crowd_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::form;

/// A project row from the `projects` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Project {
    pub id: DbId,
    pub name: String,
    pub short_name: String,
    pub description: String,
    pub long_description: String,
    pub allow_anonymous_contributors: bool,
    pub hidden: bool,
    pub webhook: Option<String>,
    pub category_id: Option<DbId>,
    #[serde(skip_serializing)]
    pub passwd_hash: Option<String>,
    pub owner_id: DbId,
    pub info: serde_json::Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Project {
    /// Attribute map used for change detection, including the password hash
    /// that is hidden from API responses.
    pub fn snapshot(&self) -> Snapshot {
        let mut map = match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => Snapshot::new(),
        };
        map.insert(
            "passwd_hash".to_string(),
            self.passwd_hash
                .clone()
                .map_or(serde_json::Value::Null, serde_json::Value::String),
        );
        map
    }

    /// The `info` bag as a map; non-object values read as empty.
    pub fn info_map(&self) -> Snapshot {
        match &self.info {
            serde_json::Value::Object(map) => map.clone(),
            _ => Snapshot::new(),
        }
    }
}

/// DTO for creating a new project. The owner comes from the authenticated
/// user, not the payload.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProject {
    pub name: String,
    pub short_name: String,
    pub description: Option<String>,
    pub long_description: Option<String>,
    #[serde(default, deserialize_with = "form::flag")]
    pub allow_anonymous_contributors: Option<bool>,
    #[serde(default, deserialize_with = "form::flag")]
    pub hidden: Option<bool>,
    pub webhook: Option<String>,
    #[serde(default, deserialize_with = "form::integer")]
    pub category_id: Option<DbId>,
    pub info: Option<serde_json::Map<String, serde_json::Value>>,
}

/// DTO for updating a project. Only present fields are applied; `info` keys
/// are merged into the stored bag.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProject {
    pub name: Option<String>,
    pub short_name: Option<String>,
    pub description: Option<String>,
    pub long_description: Option<String>,
    #[serde(default, deserialize_with = "form::flag")]
    pub allow_anonymous_contributors: Option<bool>,
    #[serde(default, deserialize_with = "form::flag")]
    pub hidden: Option<bool>,
    pub webhook: Option<String>,
    #[serde(default, deserialize_with = "form::integer")]
    pub category_id: Option<DbId>,
    pub info: Option<serde_json::Map<String, serde_json::Value>>,
    /// Plaintext as submitted. Never stored; hashed into `passwd_hash`.
    pub password: Option<String>,
    #[serde(skip)]
    pub passwd_hash: Option<String>,
}
