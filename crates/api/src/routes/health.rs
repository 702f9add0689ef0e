//! `GET /health`: database reachability, applied schema version and pool
//! usage. Answers 503 while the database is unreachable.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{routing::get, Json, Router};
use crowd_db::DbPool;
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthReport {
    /// `ok` or `unavailable`.
    pub status: &'static str,
    pub version: &'static str,
    pub database: DatabaseHealth,
}

#[derive(Debug, Serialize)]
pub struct DatabaseHealth {
    pub reachable: bool,
    /// Newest applied migration, `null` when unknown.
    pub schema_version: Option<i64>,
    pub pool_size: u32,
    pub idle_connections: usize,
}

async fn database_health(pool: &DbPool) -> DatabaseHealth {
    let reachable = match crowd_db::health_check(pool).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Database health check failed");
            false
        }
    };

    let schema_version = if reachable {
        crowd_db::schema_version(pool).await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Could not read schema version");
            None
        })
    } else {
        None
    };

    DatabaseHealth {
        reachable,
        schema_version,
        pool_size: pool.size(),
        idle_connections: pool.num_idle(),
    }
}

async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthReport>) {
    let database = database_health(&state.pool).await;
    let (code, status) = if database.reachable {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
    };

    let report = HealthReport {
        status,
        version: env!("CARGO_PKG_VERSION"),
        database,
    };
    (code, Json(report))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
