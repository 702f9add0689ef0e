#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{Method, Request, Response};
use axum::Router;
use crowd_api::auth::jwt::JwtConfig;
use crowd_api::auth::password::hash_password;
use crowd_api::config::ServerConfig;
use crowd_api::router::build_app_router;
use crowd_api::state::AppState;
use crowd_core::types::DbId;
use crowd_db::models::audit::{AuditLog, AuditLogFilter};
use crowd_db::models::project::{CreateProject, Project};
use crowd_db::models::task::{CreateTask, Task};
use crowd_db::models::user::{CreateUser, User};
use crowd_db::repositories::{AuditLogRepo, ProjectRepo, TaskRepo, UserRepo};
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

/// Plaintext password given to every test user.
pub const PASSWORD: &str = "p4ssw0rd";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 15,
        },
    }
}

/// Build the full application router with all middleware layers, using the
/// given database pool.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
    };
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Insert a user whose API key is `<name>-key`.
pub async fn create_user(pool: &PgPool, name: &str, admin: bool, pro: bool) -> User {
    let input = CreateUser {
        name: name.to_string(),
        fullname: Some(format!("{name} fullname")),
        email: format!("{name}@example.com"),
        passwd_hash: Some(hash_password(PASSWORD).expect("hashing should succeed")),
        api_key: api_key(name),
        admin,
        pro,
    };
    UserRepo::create(pool, &input)
        .await
        .expect("user creation should succeed")
}

pub fn api_key(name: &str) -> String {
    format!("{name}-key")
}

/// Insert a project directly, bypassing the audit trail.
pub async fn create_project(pool: &PgPool, owner: &User, short_name: &str) -> Project {
    let input = CreateProject {
        name: "Sample Project".to_string(),
        short_name: short_name.to_string(),
        description: Some("Description".to_string()),
        long_description: Some("Long description".to_string()),
        allow_anonymous_contributors: None,
        hidden: None,
        webhook: None,
        category_id: None,
        info: None,
    };
    ProjectRepo::create(pool, owner.id, &input)
        .await
        .expect("project creation should succeed")
}

pub async fn create_task(pool: &PgPool, project: &Project) -> Task {
    let input = CreateTask {
        project_id: project.id,
        info: None,
        priority_0: None,
        n_answers: None,
    };
    TaskRepo::create(pool, &input)
        .await
        .expect("task creation should succeed")
}

/// All audit entries for a project, in creation order.
pub async fn audit_logs(pool: &PgPool, app_id: DbId) -> Vec<AuditLog> {
    let filter = AuditLogFilter {
        app_id: Some(app_id),
        ..Default::default()
    };
    AuditLogRepo::filter_by(pool, &filter)
        .await
        .expect("audit query should succeed")
}

/// The single entry recorded for `attribute`.
pub fn entry<'a>(logs: &'a [AuditLog], attribute: &str) -> &'a AuditLog {
    let matching: Vec<_> = logs.iter().filter(|l| l.attribute == attribute).collect();
    assert_eq!(matching.len(), 1, "expected one entry for {attribute}, got {logs:?}");
    matching[0]
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Append `api_key=<key>` to a URI.
pub fn with_key(uri: &str, key: Option<&str>) -> String {
    match key {
        None => uri.to_string(),
        Some(key) if uri.contains('?') => format!("{uri}&api_key={key}"),
        Some(key) => format!("{uri}?api_key={key}"),
    }
}

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.expect("request should complete")
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn json_request(
    app: Router,
    method: Method,
    uri: &str,
    body: serde_json::Value,
) -> Response<Body> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn delete(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_form(app: Router, uri: &str, fields: &[(&str, &str)]) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(encode_form(fields)))
        .unwrap();
    send(app, request).await
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

pub fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

fn encode_form(fields: &[(&str, &str)]) -> String {
    fields
        .iter()
        .map(|(k, v)| format!("{}={}", percent_encode(k), percent_encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

fn percent_encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}
