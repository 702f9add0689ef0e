/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// The authenticated user behind a request.
///
/// Built by the API layer from the `users` table; the domain only needs the
/// identity and the two privilege flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: DbId,
    pub name: String,
    pub admin: bool,
    pub pro: bool,
}
