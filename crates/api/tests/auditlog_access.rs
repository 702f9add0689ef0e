//! Access control and paging for `GET /app/{short_name}/auditlog`, plus the
//! sign-in flow that browser users go through to reach it.

mod common;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, COOKIE, SET_COOKIE};
use axum::http::{Method, Request, StatusCode};
use common::{
    api_key, body_json, create_user, get, json_request, location, post_form, send, with_key,
    PASSWORD,
};
use serde_json::json;
use sqlx::PgPool;

const AUDITLOG: &str = "/app/sampleapp/auditlog";

/// Create `sampleapp` owned by `owner` through the API and change three
/// attributes, leaving four audit entries.
async fn project_with_history(pool: &PgPool, owner: &str) -> i64 {
    let app = common::build_test_app(pool.clone());
    let key = api_key(owner);

    let response = json_request(
        app.clone(),
        Method::POST,
        &with_key("/api/app", Some(&key)),
        json!({"name": "Sample Project", "short_name": "sampleapp"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let id = body_json(response).await["id"].as_i64().unwrap();

    let response = json_request(
        app,
        Method::PUT,
        &with_key(&format!("/api/app/{id}"), Some(&key)),
        json!({"name": "Renamed", "description": "New", "hidden": true}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    id
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn anonymous_is_redirected_to_sign_in(pool: PgPool) {
    create_user(&pool, "johndoe", false, false).await;
    project_with_history(&pool, "johndoe").await;
    let app = common::build_test_app(pool);

    let response = get(app, AUDITLOG).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/account/signin");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_api_key_counts_as_anonymous(pool: PgPool) {
    create_user(&pool, "johndoe", false, false).await;
    project_with_history(&pool, "johndoe").await;
    let app = common::build_test_app(pool);

    let response = get(app, &with_key(AUDITLOG, Some("no-such-key"))).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn plain_user_is_forbidden(pool: PgPool) {
    create_user(&pool, "johndoe", false, false).await;
    create_user(&pool, "janedoe", false, false).await;
    project_with_history(&pool, "johndoe").await;
    let app = common::build_test_app(pool);

    let response = get(app, &with_key(AUDITLOG, Some(&api_key("janedoe")))).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["code"], "FORBIDDEN");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn owner_admin_and_pro_may_view(pool: PgPool) {
    create_user(&pool, "johndoe", false, false).await;
    create_user(&pool, "root", true, false).await;
    create_user(&pool, "propal", false, true).await;
    let id = project_with_history(&pool, "johndoe").await;
    let app = common::build_test_app(pool);

    for viewer in ["johndoe", "root", "propal"] {
        let response = get(app.clone(), &with_key(AUDITLOG, Some(&api_key(viewer)))).await;
        assert_eq!(response.status(), StatusCode::OK, "viewer {viewer}");

        let body = body_json(response).await;
        assert_eq!(body["data"]["total"], 4);
        let items = body["data"]["items"].as_array().unwrap();
        assert_eq!(items.len(), 4);
        assert!(items.iter().all(|i| i["app_id"] == id));

        let attributes: Vec<_> = items.iter().map(|i| i["attribute"].as_str().unwrap()).collect();
        assert_eq!(attributes, vec!["project", "name", "description", "hidden"]);
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn missing_project_is_not_found(pool: PgPool) {
    create_user(&pool, "root", true, false).await;
    let app = common::build_test_app(pool);

    let response = get(app, &with_key("/app/nope/auditlog", Some(&api_key("root")))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn offset_and_limit_page_through_entries(pool: PgPool) {
    create_user(&pool, "johndoe", false, false).await;
    project_with_history(&pool, "johndoe").await;
    let app = common::build_test_app(pool);
    let key = api_key("johndoe");

    let uri = with_key(&format!("{AUDITLOG}?offset=1&limit=2"), Some(&key));
    let response = get(app.clone(), &uri).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["total"], 4);
    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["attribute"], "name");
    assert_eq!(items[1]["attribute"], "description");

    let uri = with_key(&format!("{AUDITLOG}?offset=10"), Some(&key));
    let body = body_json(get(app, &uri).await).await;
    assert!(body["data"]["items"].as_array().unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Sign-in
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn sign_in_page_renders_form(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = get(app, "/account/signin").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn session_cookie_grants_access(pool: PgPool) {
    create_user(&pool, "johndoe", false, false).await;
    project_with_history(&pool, "johndoe").await;
    let app = common::build_test_app(pool);

    let response = post_form(
        app.clone(),
        "/account/signin",
        &[("name", "johndoe"), ("password", PASSWORD)],
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response
        .headers()
        .get(SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .expect("sign-in should set a cookie")
        .split(';')
        .next()
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("session="));

    let body = body_json(response).await;
    assert_eq!(body["data"]["token_type"], "Bearer");
    assert_eq!(body["data"]["user"]["name"], "johndoe");
    assert!(body["data"]["user"].get("passwd_hash").is_none());
    let token = body["data"]["access_token"].as_str().unwrap().to_string();

    let request = Request::builder()
        .uri(AUDITLOG)
        .header(COOKIE, &cookie)
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(app.clone(), request).await.status(), StatusCode::OK);

    let request = Request::builder()
        .uri(AUDITLOG)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(app, request).await.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn wrong_password_is_unauthorized(pool: PgPool) {
    create_user(&pool, "johndoe", false, false).await;
    let app = common::build_test_app(pool);

    let response = post_form(
        app.clone(),
        "/account/signin",
        &[("name", "johndoe"), ("password", "wrong")],
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(SET_COOKIE).is_none());

    let response = post_form(
        app,
        "/account/signin",
        &[("name", "nobody"), ("password", PASSWORD)],
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn garbage_session_cookie_counts_as_anonymous(pool: PgPool) {
    create_user(&pool, "johndoe", false, false).await;
    project_with_history(&pool, "johndoe").await;
    let app = common::build_test_app(pool);

    let request = Request::builder()
        .uri(AUDITLOG)
        .header(COOKIE, "session=not-a-jwt")
        .body(Body::empty())
        .unwrap();
    let response = send(app, request).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}
