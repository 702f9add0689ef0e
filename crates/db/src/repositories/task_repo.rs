//! Repository for the `tasks` table.

use crowd_core::types::DbId;
use sqlx::PgPool;

use crate::models::task::{CreateTask, Task};

const COLUMNS: &str = "id, project_id, info, priority_0, n_answers, created_at";

/// Provides CRUD operations for tasks and the project-wide task settings.
pub struct TaskRepo;

impl TaskRepo {
    /// Insert a new task. Priority defaults to 0 and redundancy to 30.
    pub async fn create(pool: &PgPool, input: &CreateTask) -> Result<Task, sqlx::Error> {
        let query = format!(
            "INSERT INTO tasks (project_id, info, priority_0, n_answers)
             VALUES ($1, COALESCE($2, '{{}}'::jsonb), COALESCE($3, 0), COALESCE($4, 30))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(input.project_id)
            .bind(&input.info)
            .bind(input.priority_0)
            .bind(input.n_answers)
            .fetch_one(pool)
            .await
    }

    /// All tasks of a project, oldest first.
    pub async fn list_by_project(pool: &PgPool, project_id: DbId) -> Result<Vec<Task>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tasks WHERE project_id = $1 ORDER BY id");
        sqlx::query_as::<_, Task>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    /// The subset of `ids` that belong to `project_id`, ordered by id.
    pub async fn find_by_ids(
        pool: &PgPool,
        project_id: DbId,
        ids: &[DbId],
    ) -> Result<Vec<Task>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tasks WHERE project_id = $1 AND id = ANY($2) ORDER BY id"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(project_id)
            .bind(ids)
            .fetch_all(pool)
            .await
    }

    /// Set `priority_0` on the given tasks of a project. Returns the number of
    /// rows updated.
    pub async fn set_priority(
        pool: &PgPool,
        project_id: DbId,
        ids: &[DbId],
        priority: f64,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE tasks SET priority_0 = $3 WHERE project_id = $1 AND id = ANY($2)",
        )
        .bind(project_id)
        .bind(ids)
        .bind(priority)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Set the redundancy of every task in a project. Returns the number of
    /// rows updated.
    pub async fn set_n_answers(
        pool: &PgPool,
        project_id: DbId,
        n_answers: i32,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("UPDATE tasks SET n_answers = $2 WHERE project_id = $1")
            .bind(project_id)
            .bind(n_answers)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
