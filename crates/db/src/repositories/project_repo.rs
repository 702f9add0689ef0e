//! Repository for the `projects` table.

use crowd_core::types::DbId;
use sqlx::PgPool;

use crate::models::project::{CreateProject, Project, UpdateProject};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "\
    id, name, short_name, description, long_description, \
    allow_anonymous_contributors, hidden, webhook, category_id, \
    passwd_hash, owner_id, info, created_at, updated_at";

/// Provides CRUD operations for projects.
pub struct ProjectRepo;

impl ProjectRepo {
    /// Insert a new project owned by `owner_id`, returning the created row.
    pub async fn create(
        pool: &PgPool,
        owner_id: DbId,
        input: &CreateProject,
    ) -> Result<Project, sqlx::Error> {
        let query = format!(
            "INSERT INTO projects (
                name, short_name, description, long_description,
                allow_anonymous_contributors, hidden, webhook, category_id,
                owner_id, info
             )
             VALUES (
                $1, $2, COALESCE($3, ''), COALESCE($4, ''),
                COALESCE($5, TRUE), COALESCE($6, FALSE), $7, $8,
                $9, COALESCE($10, '{{}}'::jsonb)
             )
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(&input.name)
            .bind(&input.short_name)
            .bind(&input.description)
            .bind(&input.long_description)
            .bind(input.allow_anonymous_contributors)
            .bind(input.hidden)
            .bind(&input.webhook)
            .bind(input.category_id)
            .bind(owner_id)
            .bind(input.info.clone().map(serde_json::Value::Object))
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Project>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects WHERE id = $1");
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_short_name(
        pool: &PgPool,
        short_name: &str,
    ) -> Result<Option<Project>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects WHERE short_name = $1");
        sqlx::query_as::<_, Project>(&query)
            .bind(short_name)
            .fetch_optional(pool)
            .await
    }

    /// Update a project. Only non-`None` fields in `input` are applied and
    /// `info` keys are merged into the stored bag.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateProject,
    ) -> Result<Option<Project>, sqlx::Error> {
        let query = format!(
            "UPDATE projects SET
                name = COALESCE($2, name),
                short_name = COALESCE($3, short_name),
                description = COALESCE($4, description),
                long_description = COALESCE($5, long_description),
                allow_anonymous_contributors = COALESCE($6, allow_anonymous_contributors),
                hidden = COALESCE($7, hidden),
                webhook = COALESCE($8, webhook),
                category_id = COALESCE($9, category_id),
                passwd_hash = COALESCE($10, passwd_hash),
                info = info || COALESCE($11, '{{}}'::jsonb),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.short_name)
            .bind(&input.description)
            .bind(&input.long_description)
            .bind(input.allow_anonymous_contributors)
            .bind(input.hidden)
            .bind(&input.webhook)
            .bind(input.category_id)
            .bind(&input.passwd_hash)
            .bind(input.info.clone().map(serde_json::Value::Object))
            .fetch_optional(pool)
            .await
    }

    /// Set a single key of the `info` bag.
    pub async fn set_info_key(
        pool: &PgPool,
        id: DbId,
        key: &str,
        value: &serde_json::Value,
    ) -> Result<Option<Project>, sqlx::Error> {
        let query = format!(
            "UPDATE projects SET
                info = info || jsonb_build_object($2::text, $3::jsonb),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(key)
            .bind(value)
            .fetch_optional(pool)
            .await
    }

    /// Permanently delete a project (and its tasks). Returns `true` if a row
    /// was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
