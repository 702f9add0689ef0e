//! Browser form endpoints and the audit entries they write.

mod common;

use axum::http::StatusCode;
use common::{
    api_key, audit_logs, create_project, create_task, create_user, entry, location, post_form,
    with_key,
};
use crowd_db::repositories::{ProjectRepo, TaskRepo};
use serde_json::{json, Value};
use sqlx::PgPool;

fn parse(value: Option<&str>) -> Value {
    serde_json::from_str(value.expect("value should be set")).expect("value should be JSON")
}

// ---------------------------------------------------------------------------
// Project lifecycle
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn web_create_redirects_and_records_entry(pool: PgPool) {
    let owner = create_user(&pool, "johndoe", false, false).await;
    let app = common::build_test_app(pool.clone());

    let uri = with_key("/app/new", Some(&api_key("johndoe")));
    let response = post_form(
        app,
        &uri,
        &[("name", "Sample Project"), ("short_name", "sampleapp"), ("description", "d")],
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/app/sampleapp");

    let project = ProjectRepo::find_by_short_name(&pool, "sampleapp")
        .await
        .unwrap()
        .expect("project should exist");
    assert_eq!(project.owner_id, owner.id);

    let logs = audit_logs(&pool, project.id).await;
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].caller, "web");
    assert_eq!(logs[0].action, "create");
    assert_eq!(logs[0].old_value.as_deref(), Some("Nothing"));
    assert_eq!(logs[0].new_value.as_deref(), Some("New project"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn anonymous_form_post_redirects_to_sign_in(pool: PgPool) {
    let app = common::build_test_app(pool.clone());

    let response = post_form(
        app,
        "/app/new",
        &[("name", "Sample Project"), ("short_name", "sampleapp")],
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/account/signin");

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM audit_logs")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn web_update_records_changed_fields_as_text(pool: PgPool) {
    let owner = create_user(&pool, "johndoe", false, false).await;
    let project = create_project(&pool, &owner, "sampleapp").await;
    let app = common::build_test_app(pool.clone());

    let uri = with_key("/app/sampleapp/update", Some(&api_key("johndoe")));
    let response = post_form(
        app,
        &uri,
        &[
            ("id", &project.id.to_string()),
            ("name", "Renamed Project"),
            ("short_name", "sampleapp"),
            ("description", "Description"),
            ("long_description", "Long description"),
            ("allow_anonymous_contributors", "False"),
            ("hidden", "True"),
            ("btn", "Save"),
        ],
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/app/sampleapp");

    let logs = audit_logs(&pool, project.id).await;
    assert_eq!(logs.len(), 3);
    assert!(logs.iter().all(|l| l.caller == "web" && l.action == "update"));

    let name = entry(&logs, "name");
    assert_eq!(name.old_value.as_deref(), Some("Sample Project"));
    assert_eq!(name.new_value.as_deref(), Some("Renamed Project"));

    let anonymous = entry(&logs, "allow_anonymous_contributors");
    assert_eq!(anonymous.old_value.as_deref(), Some("True"));
    assert_eq!(anonymous.new_value.as_deref(), Some("False"));

    let hidden = entry(&logs, "hidden");
    assert_eq!(hidden.old_value.as_deref(), Some("False"));
    assert_eq!(hidden.new_value.as_deref(), Some("True"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn web_rename_is_logged_under_new_short_name(pool: PgPool) {
    let owner = create_user(&pool, "johndoe", false, false).await;
    let project = create_project(&pool, &owner, "sampleapp").await;
    let app = common::build_test_app(pool.clone());

    let uri = with_key("/app/sampleapp/update", Some(&api_key("johndoe")));
    let response = post_form(app, &uri, &[("short_name", "newname")]).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/app/newname");

    let logs = audit_logs(&pool, project.id).await;
    let log = entry(&logs, "short_name");
    assert_eq!(log.app_short_name, "newname");
    assert_eq!(log.old_value.as_deref(), Some("sampleapp"));
    assert_eq!(log.new_value.as_deref(), Some("newname"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn web_password_records_hash(pool: PgPool) {
    let owner = create_user(&pool, "johndoe", false, false).await;
    let project = create_project(&pool, &owner, "sampleapp").await;
    let app = common::build_test_app(pool.clone());

    let uri = with_key("/app/sampleapp/update", Some(&api_key("johndoe")));
    let response = post_form(app, &uri, &[("password", "hello world")]).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let logs = audit_logs(&pool, project.id).await;
    let log = entry(&logs, "passwd_hash");
    assert_eq!(log.old_value.as_deref(), Some("null"));
    assert_ne!(log.new_value.as_deref(), Some("hello world"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn rejected_web_update_records_nothing(pool: PgPool) {
    let owner = create_user(&pool, "johndoe", false, false).await;
    create_user(&pool, "intruder", false, true).await;
    let project = create_project(&pool, &owner, "sampleapp").await;
    let app = common::build_test_app(pool.clone());

    let uri = with_key("/app/sampleapp/update", Some(&api_key("intruder")));
    let response = post_form(app, &uri, &[("name", "Hacked")]).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    assert!(audit_logs(&pool, project.id).await.is_empty());
    let unchanged = ProjectRepo::find_by_id(&pool, project.id).await.unwrap().unwrap();
    assert_eq!(unchanged.name, "Sample Project");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn web_delete_records_entry(pool: PgPool) {
    let owner = create_user(&pool, "johndoe", false, false).await;
    let project = create_project(&pool, &owner, "sampleapp").await;
    let app = common::build_test_app(pool.clone());

    let uri = with_key("/app/sampleapp/delete", Some(&api_key("johndoe")));
    let response = post_form(app, &uri, &[]).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let logs = audit_logs(&pool, project.id).await;
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].action, "delete");
    assert_eq!(logs[0].caller, "web");
    assert_eq!(logs[0].old_value.as_deref(), Some("Saved"));
    assert_eq!(logs[0].new_value.as_deref(), Some("Deleted"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn delete_that_removes_nothing_records_nothing(pool: PgPool) {
    let owner = create_user(&pool, "johndoe", false, false).await;
    let project = create_project(&pool, &owner, "sampleapp").await;

    // Stands in for a concurrent delete winning between lookup and delete.
    sqlx::query(
        "CREATE FUNCTION keep_projects() RETURNS TRIGGER AS $$ \
         BEGIN RETURN NULL; END; $$ LANGUAGE plpgsql",
    )
    .execute(&pool)
    .await
    .unwrap();
    sqlx::query(
        "CREATE TRIGGER trg_keep_projects BEFORE DELETE ON projects \
         FOR EACH ROW EXECUTE FUNCTION keep_projects()",
    )
    .execute(&pool)
    .await
    .unwrap();

    let app = common::build_test_app(pool.clone());
    let uri = with_key("/app/sampleapp/delete", Some(&api_key("johndoe")));
    let response = post_form(app, &uri, &[]).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    assert!(audit_logs(&pool, project.id).await.is_empty());
}

// ---------------------------------------------------------------------------
// Task settings
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn task_presenter_first_set_has_null_old_value(pool: PgPool) {
    let owner = create_user(&pool, "johndoe", false, false).await;
    let project = create_project(&pool, &owner, "sampleapp").await;
    let app = common::build_test_app(pool.clone());

    let uri = with_key(
        "/app/sampleapp/tasks/taskpresentereditor",
        Some(&api_key("johndoe")),
    );
    let response = post_form(app.clone(), &uri, &[("editor", "<div>Hi</div>")]).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let logs = audit_logs(&pool, project.id).await;
    let log = entry(&logs, "task_presenter");
    assert_eq!(log.old_value, None);
    assert_eq!(log.new_value.as_deref(), Some("<div>Hi</div>"));

    // Saving the same presenter again changes nothing.
    let response = post_form(app, &uri, &[("editor", "<div>Hi</div>")]).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(audit_logs(&pool, project.id).await.len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn scheduler_change_starts_from_default(pool: PgPool) {
    let owner = create_user(&pool, "johndoe", false, false).await;
    let project = create_project(&pool, &owner, "sampleapp").await;
    let app = common::build_test_app(pool.clone());

    let uri = with_key("/app/sampleapp/tasks/scheduler", Some(&api_key("johndoe")));
    let response = post_form(app.clone(), &uri, &[("sched", "random")]).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let logs = audit_logs(&pool, project.id).await;
    let log = entry(&logs, "sched");
    assert_eq!(log.old_value.as_deref(), Some("default"));
    assert_eq!(log.new_value.as_deref(), Some("random"));

    let response = post_form(app, &uri, &[("sched", "bogus")]).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(audit_logs(&pool, project.id).await.len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn priority_records_one_entry_per_task(pool: PgPool) {
    let owner = create_user(&pool, "johndoe", false, false).await;
    let project = create_project(&pool, &owner, "sampleapp").await;
    let first = create_task(&pool, &project).await;
    let second = create_task(&pool, &project).await;
    let untouched = create_task(&pool, &project).await;
    let app = common::build_test_app(pool.clone());

    let ids = format!("{},{}", first.id, second.id);
    let uri = with_key("/app/sampleapp/tasks/priority", Some(&api_key("johndoe")));
    let response = post_form(app, &uri, &[("task_ids", &ids), ("priority_0", "0.5")]).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let logs = audit_logs(&pool, project.id).await;
    assert_eq!(logs.len(), 2);
    for (log, task) in logs.iter().zip([&first, &second]) {
        assert_eq!(log.attribute, "task.priority_0");
        assert_eq!(
            log.old_value.as_deref(),
            Some(format!(r#"{{"task_id": {}, "task_priority_0": 0.0}}"#, task.id).as_str())
        );
        assert_eq!(
            log.new_value.as_deref(),
            Some(format!(r#"{{"task_id": {}, "task_priority_0": 0.5}}"#, task.id).as_str())
        );
        assert_eq!(
            parse(log.new_value.as_deref()),
            json!({"task_id": task.id, "task_priority_0": 0.5})
        );
    }

    let tasks = TaskRepo::list_by_project(&pool, project.id).await.unwrap();
    let other = tasks.iter().find(|t| t.id == untouched.id).unwrap();
    assert_eq!(other.priority_0, 0.0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn priority_out_of_range_is_rejected(pool: PgPool) {
    let owner = create_user(&pool, "johndoe", false, false).await;
    let project = create_project(&pool, &owner, "sampleapp").await;
    let task = create_task(&pool, &project).await;
    let app = common::build_test_app(pool.clone());

    let uri = with_key("/app/sampleapp/tasks/priority", Some(&api_key("johndoe")));
    let response = post_form(
        app,
        &uri,
        &[("task_ids", &task.id.to_string()), ("priority_0", "1.5")],
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(audit_logs(&pool, project.id).await.is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn redundancy_records_single_entry(pool: PgPool) {
    let owner = create_user(&pool, "johndoe", false, false).await;
    let project = create_project(&pool, &owner, "sampleapp").await;
    create_task(&pool, &project).await;
    create_task(&pool, &project).await;
    let app = common::build_test_app(pool.clone());

    let uri = with_key("/app/sampleapp/tasks/redundancy", Some(&api_key("johndoe")));
    let response = post_form(app, &uri, &[("n_answers", "10")]).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let logs = audit_logs(&pool, project.id).await;
    let log = entry(&logs, "task.n_answers");
    assert_eq!(log.old_value.as_deref(), Some("30"));
    assert_eq!(log.new_value.as_deref(), Some("10"));

    let tasks = TaskRepo::list_by_project(&pool, project.id).await.unwrap();
    assert!(tasks.iter().all(|t| t.n_answers == 10));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn redundancy_without_tasks_is_rejected(pool: PgPool) {
    let owner = create_user(&pool, "johndoe", false, false).await;
    let project = create_project(&pool, &owner, "sampleapp").await;
    let app = common::build_test_app(pool.clone());

    let uri = with_key("/app/sampleapp/tasks/redundancy", Some(&api_key("johndoe")));
    let response = post_form(app, &uri, &[("n_answers", "10")]).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(audit_logs(&pool, project.id).await.is_empty());
}
