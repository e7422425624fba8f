use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use taskmind::app::build_app;
use taskmind::config::AppConfig;
use taskmind::state::AppState;
use taskmind::store::JsonStore;

async fn test_app() -> (Router, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("create tempdir");
    let data_file = dir.path().join("data.json");
    let store = JsonStore::open(data_file.clone()).await.expect("open store");
    let config = Arc::new(AppConfig::for_tests(data_file));
    let state = AppState::from_parts(Arc::new(store), config).expect("build state");
    (build_app(state), dir)
}

async fn send(
    app: &Router,
    method: &str,
    path: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(value) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, value)
}

async fn register(app: &Router, email: &str, username: &str, password: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "email": email, "username": username, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().expect("session token").to_string()
}

#[tokio::test]
async fn register_then_login_flow() {
    let (app, _dir) = test_app().await;

    let token = register(&app, "alice@example.com", "alice", "hunter22").await;
    assert!(!token.is_empty());

    // The same email cannot be registered twice.
    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "email": "alice@example.com", "username": "mallory", "password": "other" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Email already registered");

    // Wrong password is rejected, right one succeeds.
    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "alice@example.com", "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid credentials");

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "alice@example.com", "password": "hunter22" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["username"], "alice");

    // Unknown email gets the same error as a bad password.
    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "nobody@example.com", "password": "hunter22" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unauthenticated_api_access_is_rejected() {
    let (app, _dir) = test_app().await;
    for (method, path) in [
        ("GET", "/api/tasks"),
        ("POST", "/api/cleanup-tasks"),
        ("GET", "/api/calendar?year=2024&month=12"),
        ("GET", "/api/me"),
    ] {
        let (status, body) = send(&app, method, path, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {path}");
        assert_eq!(body["error"], "Not logged in", "{method} {path}");
    }
}

#[tokio::test]
async fn task_crud_roundtrip() {
    let (app, _dir) = test_app().await;
    let token = register(&app, "bob@example.com", "bob", "secret123").await;

    let (status, created) = send(
        &app,
        "POST",
        "/api/tasks",
        Some(&token),
        Some(json!({ "text": "water the plants", "due_date": "2026-09-05" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["title"], "water the plants");
    assert_eq!(created["completed"], false);
    assert_eq!(created["list"], "All Tasks");
    let id = created["id"].as_str().unwrap().to_string();

    let (status, tasks) = send(&app, "GET", "/api/tasks", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tasks.as_array().unwrap().len(), 1);

    // Completing stamps completed_date, reopening clears it.
    let (status, updated) = send(
        &app,
        "PUT",
        &format!("/api/tasks/{id}"),
        Some(&token),
        Some(json!({ "completed": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(updated["completed_date"].is_string());

    let (_, reopened) = send(
        &app,
        "PUT",
        &format!("/api/tasks/{id}"),
        Some(&token),
        Some(json!({ "completed": false })),
    )
    .await;
    assert!(reopened["completed_date"].is_null());

    // Unknown ids are a 404, whether malformed or merely absent.
    let (status, _) = send(
        &app,
        "PUT",
        "/api/tasks/not-a-real-id",
        Some(&token),
        Some(json!({ "completed": true })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Delete succeeds and stays successful when repeated.
    for _ in 0..2 {
        let (status, body) = send(
            &app,
            "DELETE",
            &format!("/api/tasks/{id}"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
    }

    let (_, tasks) = send(&app, "GET", "/api/tasks", Some(&token), None).await;
    assert!(tasks.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn users_cannot_see_each_others_tasks() {
    let (app, _dir) = test_app().await;
    let alice = register(&app, "alice@example.com", "alice", "password1").await;
    let bob = register(&app, "bob@example.com", "bob", "password2").await;

    let (_, created) = send(
        &app,
        "POST",
        "/api/tasks",
        Some(&alice),
        Some(json!({ "text": "alice's secret" })),
    )
    .await;
    let id = created["id"].as_str().unwrap().to_string();

    let (_, bobs_tasks) = send(&app, "GET", "/api/tasks", Some(&bob), None).await;
    assert!(bobs_tasks.as_array().unwrap().is_empty());

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/tasks/{id}"),
        Some(&bob),
        Some(json!({ "title": "hijacked" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, alices_tasks) = send(&app, "GET", "/api/tasks", Some(&alice), None).await;
    assert_eq!(alices_tasks[0]["title"], "alice's secret");
}

#[tokio::test]
async fn calendar_view_and_validation() {
    let (app, _dir) = test_app().await;
    let token = register(&app, "cal@example.com", "cal", "password1").await;

    send(
        &app,
        "POST",
        "/api/tasks",
        Some(&token),
        Some(json!({ "text": "year end review", "due_date": "2024-12-31" })),
    )
    .await;

    let (status, view) = send(
        &app,
        "GET",
        "/api/calendar?year=2024&month=12",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["next"], json!([2025, 1]));
    assert_eq!(view["prev"], json!([2024, 11]));
    assert_eq!(view["tasks_by_date"]["2024-12-31"].as_array().unwrap().len(), 1);

    let (status, _) = send(
        &app,
        "GET",
        "/api/calendar?year=2024&month=13",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        "GET",
        "/api/calendar?year=2024&month=x",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "month must be an integer");
}

#[tokio::test]
async fn chatbot_answers_with_topic_tags() {
    let (app, _dir) = test_app().await;
    let token = register(&app, "chat@example.com", "chat", "password1").await;

    let (status, reply) = send(
        &app,
        "POST",
        "/api/chatbot",
        Some(&token),
        Some(json!({ "message": "how do I add a task" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["type"], "task_help");

    send(
        &app,
        "POST",
        "/api/tasks",
        Some(&token),
        Some(json!({ "text": "call the bank" })),
    )
    .await;
    let (_, reply) = send(
        &app,
        "POST",
        "/api/chatbot",
        Some(&token),
        Some(json!({ "message": "show my tasks" })),
    )
    .await;
    assert_eq!(reply["type"], "task_list");
    assert!(reply["message"]
        .as_str()
        .unwrap()
        .contains("1 active tasks"));

    let (_, reply) = send(
        &app,
        "POST",
        "/api/chatbot",
        Some(&token),
        Some(json!({ "message": "qwerty" })),
    )
    .await;
    assert_eq!(reply["type"], "default");
}

#[tokio::test]
async fn manual_cleanup_reports_removed_count() {
    let (app, _dir) = test_app().await;
    let token = register(&app, "clean@example.com", "clean", "password1").await;

    let (status, body) = send(&app, "POST", "/api/cleanup-tasks", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["removed_count"], 0);
    assert!(body["message"].as_str().unwrap().contains("30 days"));
}

#[tokio::test]
async fn logout_revokes_the_session() {
    let (app, _dir) = test_app().await;
    let token = register(&app, "out@example.com", "out", "password1").await;

    let (status, me) = send(&app, "GET", "/api/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], "out@example.com");

    let (status, _) = send(&app, "POST", "/api/auth/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, "GET", "/api/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Not logged in");
}

#[tokio::test]
async fn health_endpoint_needs_no_auth() {
    let (app, _dir) = test_app().await;
    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("ok".into()));
}
