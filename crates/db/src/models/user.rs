//! User entity model and DTOs.

use crowd_core::types::{Actor, DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A user row from the `users` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub name: String,
    pub fullname: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub passwd_hash: Option<String>,
    #[serde(skip_serializing)]
    pub api_key: String,
    pub admin: bool,
    pub pro: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl User {
    /// The identity the audit trail and access policy work with.
    pub fn actor(&self) -> Actor {
        Actor {
            id: self.id,
            name: self.name.clone(),
            admin: self.admin,
            pro: self.pro,
        }
    }
}

/// DTO for inserting a new user. The caller hashes the password and mints
/// the API key.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUser {
    pub name: String,
    pub fullname: Option<String>,
    pub email: String,
    pub passwd_hash: Option<String>,
    pub api_key: String,
    #[serde(default)]
    pub admin: bool,
    #[serde(default)]
    pub pro: bool,
}
