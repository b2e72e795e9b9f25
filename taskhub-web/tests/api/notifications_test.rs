/// TaskHub Web - Notification API Tests.
use axum::http::{StatusCode, header};
use serde_json::Value;

use taskhub_web::store::NotificationStore;

use crate::common::{TestApp, unwrap_ok};
use crate::fixtures::create_notification;

// ==================== List / Count Tests ====================

#[tokio::test]
async fn test_list_is_newest_first_and_own_only() {
    let app = TestApp::spawn();
    let alice = app.create_user("alice").await;
    let bob = app.create_user("bob").await;
    create_notification(&app, alice.id(), "first").await;
    create_notification(&app, alice.id(), "second").await;
    create_notification(&app, bob.id(), "bob's").await;

    let response = app
        .server
        .get("/api/notifications")
        .add_header(header::AUTHORIZATION, app.auth_header(&alice.token))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    let titles: Vec<&str> = body["notifications"]
        .as_array()
        .map(|rows| rows.iter().filter_map(|n| n["title"].as_str()).collect())
        .unwrap_or_default();
    assert_eq!(titles, vec!["second", "first"]);
    assert_eq!(body["unread_count"], 2);
}

#[tokio::test]
async fn test_list_limit_and_offset() {
    let app = TestApp::spawn();
    let alice = app.create_user("alice").await;
    for i in 0..5 {
        create_notification(&app, alice.id(), &format!("n{i}")).await;
    }

    let response = app
        .server
        .get("/api/notifications?limit=2&offset=1")
        .add_header(header::AUTHORIZATION, app.auth_header(&alice.token))
        .await;
    let body: Value = response.json();
    let titles: Vec<&str> = body["notifications"]
        .as_array()
        .map(|rows| rows.iter().filter_map(|n| n["title"].as_str()).collect())
        .unwrap_or_default();
    assert_eq!(titles, vec!["n3", "n2"]);
}

#[tokio::test]
async fn test_unread_count() {
    let app = TestApp::spawn();
    let alice = app.create_user("alice").await;
    create_notification(&app, alice.id(), "a").await;
    create_notification(&app, alice.id(), "b").await;

    let response = app
        .server
        .get("/api/notifications/count")
        .add_header(header::AUTHORIZATION, app.auth_header(&alice.token))
        .await;
    let body: Value = response.json();
    assert_eq!(body["count"], 2);
}

// ==================== Mark Read Tests ====================

#[tokio::test]
async fn test_mark_read_sets_read_at_once() {
    let app = TestApp::spawn();
    let alice = app.create_user("alice").await;
    let n = create_notification(&app, alice.id(), "a").await;

    let path = format!("/api/notifications/{}/mark-read", n.id);
    let response = app
        .server
        .post(&path)
        .add_header(header::AUTHORIZATION, app.auth_header(&alice.token))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], true);

    let rows = unwrap_ok!(app.store.list_notifications(alice.id(), 10, 0).await);
    assert!(rows[0].is_read);
    let first_read_at = rows[0].read_at;
    assert!(first_read_at.is_some());

    // Second mark succeeds and leaves read_at alone.
    app.server
        .post(&path)
        .add_header(header::AUTHORIZATION, app.auth_header(&alice.token))
        .await
        .assert_status_ok();
    let rows = unwrap_ok!(app.store.list_notifications(alice.id(), 10, 0).await);
    assert_eq!(rows[0].read_at, first_read_at);
}

#[tokio::test]
async fn test_mark_read_foreign_notification_is_not_found() {
    let app = TestApp::spawn();
    let alice = app.create_user("alice").await;
    let bob = app.create_user("bob").await;
    let bobs = create_notification(&app, bob.id(), "private").await;

    let response = app
        .server
        .post(&format!("/api/notifications/{}/mark-read", bobs.id))
        .add_header(header::AUTHORIZATION, app.auth_header(&alice.token))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(unwrap_ok!(app.store.unread_count(bob.id()).await), 1);
}

#[tokio::test]
async fn test_mark_all_read() {
    let app = TestApp::spawn();
    let alice = app.create_user("alice").await;
    let bob = app.create_user("bob").await;
    create_notification(&app, alice.id(), "a").await;
    create_notification(&app, alice.id(), "b").await;
    create_notification(&app, bob.id(), "c").await;

    let response = app
        .server
        .post("/api/notifications/mark-all-read")
        .add_header(header::AUTHORIZATION, app.auth_header(&alice.token))
        .await;
    let body: Value = response.json();
    assert_eq!(body["updated"], 2);
    assert_eq!(unwrap_ok!(app.store.unread_count(alice.id()).await), 0);
    assert_eq!(unwrap_ok!(app.store.unread_count(bob.id()).await), 1);
}

// ==================== Delete Tests ====================

#[tokio::test]
async fn test_delete_one_and_clear() {
    let app = TestApp::spawn();
    let alice = app.create_user("alice").await;
    let bob = app.create_user("bob").await;
    let first = create_notification(&app, alice.id(), "a").await;
    create_notification(&app, alice.id(), "b").await;
    create_notification(&app, alice.id(), "c").await;
    let bobs = create_notification(&app, bob.id(), "d").await;

    app.server
        .delete(&format!("/api/notifications/{}", first.id))
        .add_header(header::AUTHORIZATION, app.auth_header(&alice.token))
        .await
        .assert_status_ok();

    let response = app
        .server
        .delete(&format!("/api/notifications/{}", bobs.id))
        .add_header(header::AUTHORIZATION, app.auth_header(&alice.token))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    let response = app
        .server
        .delete("/api/notifications")
        .add_header(header::AUTHORIZATION, app.auth_header(&alice.token))
        .await;
    let body: Value = response.json();
    assert_eq!(body["deleted"], 2);

    assert!(unwrap_ok!(app.store.list_notifications(alice.id(), 10, 0).await).is_empty());
    assert_eq!(unwrap_ok!(app.store.list_notifications(bob.id(), 10, 0).await).len(), 1);
}
