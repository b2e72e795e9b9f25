/// TaskHub Web - Task API Tests.
///
/// Task mutations and the notifications they emit.
use axum::http::{StatusCode, header};
use chrono::{Duration, Utc};
use serde_json::{Value, json};

use taskhub_web::models::{NotificationKind, TaskStatus};
use taskhub_web::store::{NotificationStore, TaskStore};

use crate::common::{TestApp, unwrap_ok, unwrap_some};
use crate::fixtures::create_task;

async fn notification_kinds(app: &TestApp, user_id: i32) -> Vec<NotificationKind> {
    unwrap_ok!(app.store.list_notifications(user_id, 50, 0).await)
        .iter()
        .rev()
        .filter_map(|n| n.kind())
        .collect()
}

// ==================== Create Tests ====================

#[tokio::test]
async fn test_create_task_notifies_task_created() {
    let app = TestApp::spawn();
    let alice = app.create_user("alice").await;

    let response = app
        .server
        .post("/api/tasks")
        .add_header(header::AUTHORIZATION, app.auth_header(&alice.token))
        .json(&json!({ "title": "Write report", "priority": "high" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);

    let body: Value = response.json();
    assert_eq!(body["title"], "Write report");
    assert_eq!(body["status"], "pending");
    assert_eq!(body["priority"], "high");

    let rows = unwrap_ok!(app.store.list_notifications(alice.id(), 10, 0).await);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].notification_type, "task_created");
    assert_eq!(rows[0].message, "Task \"Write report\" has been created.");
    assert_eq!(rows[0].related_task_id, body["id"].as_i64().map(|id| id as i32));
}

#[tokio::test]
async fn test_create_task_rejects_blank_title() {
    let app = TestApp::spawn();
    let alice = app.create_user("alice").await;

    let response = app
        .server
        .post("/api/tasks")
        .add_header(header::AUTHORIZATION, app.auth_header(&alice.token))
        .json(&json!({ "title": "   " }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(unwrap_ok!(app.store.unread_count(alice.id()).await), 0);
}

#[tokio::test]
async fn test_create_task_rejects_foreign_category() {
    let app = TestApp::spawn();
    let alice = app.create_user("alice").await;
    let bob = app.create_user("bob").await;

    let response = app
        .server
        .post("/api/categories")
        .add_header(header::AUTHORIZATION, app.auth_header(&bob.token))
        .json(&json!({ "name": "Bob's" }))
        .await;
    let category: Value = response.json();

    let response = app
        .server
        .post("/api/tasks")
        .add_header(header::AUTHORIZATION, app.auth_header(&alice.token))
        .json(&json!({ "title": "Sneaky", "category_id": category["id"] }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

// ==================== Update / Complete Tests ====================

#[tokio::test]
async fn test_update_into_completed_notifies_updated_and_completed() {
    let app = TestApp::spawn();
    let alice = app.create_user("alice").await;
    let task = create_task(&app, alice.id(), "Ship", TaskStatus::Pending, None).await;

    let response = app
        .server
        .put(&format!("/api/tasks/{}", task.id))
        .add_header(header::AUTHORIZATION, app.auth_header(&alice.token))
        .json(&json!({ "title": "Ship it", "status": "completed" }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "completed");
    assert!(body["completed_at"].is_string());

    assert_eq!(
        notification_kinds(&app, alice.id()).await,
        vec![NotificationKind::TaskUpdated, NotificationKind::TaskCompleted]
    );
}

#[tokio::test]
async fn test_update_reopening_clears_completed_at() {
    let app = TestApp::spawn();
    let alice = app.create_user("alice").await;
    let task = create_task(&app, alice.id(), "Ship", TaskStatus::Completed, None).await;
    assert!(task.completed_at.is_some());

    app.server
        .put(&format!("/api/tasks/{}", task.id))
        .add_header(header::AUTHORIZATION, app.auth_header(&alice.token))
        .json(&json!({ "title": "Ship", "status": "in_progress" }))
        .await
        .assert_status_ok();

    let stored = unwrap_some!(unwrap_ok!(app.store.find_task(alice.id(), task.id).await));
    assert_eq!(stored.status(), TaskStatus::InProgress);
    assert!(stored.completed_at.is_none());
    assert_eq!(
        notification_kinds(&app, alice.id()).await,
        vec![NotificationKind::TaskUpdated]
    );
}

#[tokio::test]
async fn test_complete_is_idempotent() {
    let app = TestApp::spawn();
    let alice = app.create_user("alice").await;
    let task = create_task(&app, alice.id(), "Ship", TaskStatus::InProgress, None).await;
    let path = format!("/api/tasks/{}/complete", task.id);

    let response = app
        .server
        .post(&path)
        .add_header(header::AUTHORIZATION, app.auth_header(&alice.token))
        .await;
    let body: Value = response.json();
    assert_eq!(body["changed"], true);

    let response = app
        .server
        .post(&path)
        .add_header(header::AUTHORIZATION, app.auth_header(&alice.token))
        .await;
    let body: Value = response.json();
    assert_eq!(body["changed"], false);

    assert_eq!(
        notification_kinds(&app, alice.id()).await,
        vec![NotificationKind::TaskCompleted]
    );
}

// ==================== Isolation Tests ====================

#[tokio::test]
async fn test_foreign_task_is_not_found() {
    let app = TestApp::spawn();
    let alice = app.create_user("alice").await;
    let bob = app.create_user("bob").await;
    let task = create_task(&app, bob.id(), "Bob's", TaskStatus::Pending, None).await;
    let path = format!("/api/tasks/{}", task.id);

    let response = app
        .server
        .get(&path)
        .add_header(header::AUTHORIZATION, app.auth_header(&alice.token))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    let response = app
        .server
        .delete(&path)
        .add_header(header::AUTHORIZATION, app.auth_header(&alice.token))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    assert!(unwrap_ok!(app.store.find_task(bob.id(), task.id).await).is_some());
}

// ==================== List Tests ====================

#[tokio::test]
async fn test_list_filters_and_search() {
    let app = TestApp::spawn();
    let alice = app.create_user("alice").await;
    create_task(&app, alice.id(), "Buy MILK", TaskStatus::Pending, None).await;
    create_task(&app, alice.id(), "Call mom", TaskStatus::Completed, None).await;
    create_task(&app, alice.id(), "Buy bread", TaskStatus::InProgress, None).await;

    let response = app
        .server
        .get("/api/tasks?search=buy&status=pending")
        .add_header(header::AUTHORIZATION, app.auth_header(&alice.token))
        .await;
    let body: Value = response.json();
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["title"], "Buy MILK");

    let response = app
        .server
        .get("/api/tasks?search=milk")
        .add_header(header::AUTHORIZATION, app.auth_header(&alice.token))
        .await;
    let body: Value = response.json();
    assert_eq!(body["total"], 1);
}

#[tokio::test]
async fn test_list_pagination_clamps() {
    let app = TestApp::spawn();
    let alice = app.create_user("alice").await;
    for i in 0..12 {
        create_task(&app, alice.id(), &format!("t{i}"), TaskStatus::Pending, None).await;
    }

    let response = app
        .server
        .get("/api/tasks?per_page=5&page=99")
        .add_header(header::AUTHORIZATION, app.auth_header(&alice.token))
        .await;
    let body: Value = response.json();
    assert_eq!(body["per_page"], 5);
    assert_eq!(body["num_pages"], 3);
    assert_eq!(body["page"], 3);
    assert_eq!(body["items"].as_array().map(Vec::len), Some(2));

    let response = app
        .server
        .get("/api/tasks?per_page=7")
        .add_header(header::AUTHORIZATION, app.auth_header(&alice.token))
        .await;
    let body: Value = response.json();
    assert_eq!(body["per_page"], 10);
    assert_eq!(body["page"], 1);
}

#[tokio::test]
async fn test_list_pagination_ignores_non_numeric_params() {
    let app = TestApp::spawn();
    let alice = app.create_user("alice").await;
    for i in 0..12 {
        create_task(&app, alice.id(), &format!("t{i}"), TaskStatus::Pending, None).await;
    }

    let response = app
        .server
        .get("/api/tasks?per_page=abc&page=last")
        .add_header(header::AUTHORIZATION, app.auth_header(&alice.token))
        .await;
    response.assert_status(StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["per_page"], 10);
    assert_eq!(body["page"], 1);
    assert_eq!(body["num_pages"], 2);
}

// ==================== Dashboard Tests ====================

#[tokio::test]
async fn test_dashboard_counts() {
    let app = TestApp::spawn();
    let alice = app.create_user("alice").await;
    let yesterday = Some(Utc::now() - Duration::days(1));
    create_task(&app, alice.id(), "late", TaskStatus::Pending, yesterday).await;
    create_task(&app, alice.id(), "doing", TaskStatus::InProgress, None).await;
    create_task(&app, alice.id(), "done", TaskStatus::Completed, yesterday).await;

    let response = app
        .server
        .get("/api/dashboard")
        .add_header(header::AUTHORIZATION, app.auth_header(&alice.token))
        .await;
    let body: Value = response.json();
    assert_eq!(body["total"], 3);
    assert_eq!(body["pending"], 1);
    assert_eq!(body["in_progress"], 1);
    assert_eq!(body["completed"], 1);
    assert_eq!(body["overdue"], 1);
    assert_eq!(body["medium_priority"], 3);
}
