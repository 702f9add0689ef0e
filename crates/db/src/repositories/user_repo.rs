//! Repository for the `users` table.

use crowd_core::types::DbId;
use sqlx::PgPool;

use crate::models::user::{CreateUser, User};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str =
    "id, name, fullname, email, passwd_hash, api_key, admin, pro, created_at, updated_at";

/// Provides lookup and insert operations for users.
pub struct UserRepo;

impl UserRepo {
    /// Insert a new user, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (name, fullname, email, passwd_hash, api_key, admin, pro)
             VALUES ($1, COALESCE($2, ''), $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.name)
            .bind(&input.fullname)
            .bind(&input.email)
            .bind(&input.passwd_hash)
            .bind(&input.api_key)
            .bind(input.admin)
            .bind(input.pro)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_name(pool: &PgPool, name: &str) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE name = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(name)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_api_key(
        pool: &PgPool,
        api_key: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE api_key = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(api_key)
            .fetch_optional(pool)
            .await
    }

    /// Grant or revoke the pro tier. Returns `None` if the user does not exist.
    pub async fn set_pro(pool: &PgPool, id: DbId, pro: bool) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "UPDATE users SET pro = $2, updated_at = NOW() WHERE id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(pro)
            .fetch_optional(pool)
            .await
    }
}
