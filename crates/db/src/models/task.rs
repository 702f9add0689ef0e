//! Task entity model and DTOs.

use crowd_core::audit::Snapshot;
use crowd_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A task row from the `tasks` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Task {
    pub id: DbId,
    pub project_id: DbId,
    pub info: serde_json::Value,
    pub priority_0: f64,
    pub n_answers: i32,
    pub created_at: Timestamp,
}

impl Task {
    pub fn snapshot(&self) -> Snapshot {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => Snapshot::new(),
        }
    }
}

/// DTO for creating a task.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTask {
    pub project_id: DbId,
    pub info: Option<serde_json::Value>,
    pub priority_0: Option<f64>,
    pub n_answers: Option<i32>,
}
