/// TaskHub Web - Category API Tests.
use axum::http::{StatusCode, header};
use chrono::Utc;
use serde_json::{Value, json};

use taskhub_web::models::{NewCategory, NewTask, TaskInput};
use taskhub_web::store::{CategoryStore, TaskStore};

use crate::common::{TestApp, unwrap_ok};

#[tokio::test]
async fn test_list_includes_global_categories() {
    let app = TestApp::spawn();
    let alice = app.create_user("alice").await;
    let bob = app.create_user("bob").await;
    unwrap_ok!(
        app.store
            .insert_category(NewCategory {
                name: "Work".to_string(),
                color: "#123456".to_string(),
                user_id: None,
                created_at: Utc::now(),
            })
            .await
    );

    app.server
        .post("/api/categories")
        .add_header(header::AUTHORIZATION, app.auth_header(&alice.token))
        .json(&json!({ "name": "Errands" }))
        .await
        .assert_status(StatusCode::CREATED);
    app.server
        .post("/api/categories")
        .add_header(header::AUTHORIZATION, app.auth_header(&bob.token))
        .json(&json!({ "name": "Bob only" }))
        .await
        .assert_status(StatusCode::CREATED);

    let response = app
        .server
        .get("/api/categories")
        .add_header(header::AUTHORIZATION, app.auth_header(&alice.token))
        .await;
    let body: Value = response.json();
    let names: Vec<&str> = body
        .as_array()
        .map(|rows| rows.iter().filter_map(|c| c["name"].as_str()).collect())
        .unwrap_or_default();
    assert_eq!(names, vec!["Errands", "Work"]);
}

#[tokio::test]
async fn test_create_normalizes_color() {
    let app = TestApp::spawn();
    let alice = app.create_user("alice").await;

    let response = app
        .server
        .post("/api/categories")
        .add_header(header::AUTHORIZATION, app.auth_header(&alice.token))
        .json(&json!({ "name": "Home", "color": "ff8800" }))
        .await;
    let body: Value = response.json();
    assert_eq!(body["color"], "#ff8800");

    let response = app
        .server
        .post("/api/categories")
        .add_header(header::AUTHORIZATION, app.auth_header(&alice.token))
        .json(&json!({ "name": "Bad", "color": "orange" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_own_category() {
    let app = TestApp::spawn();
    let alice = app.create_user("alice").await;
    let bob = app.create_user("bob").await;

    let response = app
        .server
        .post("/api/categories")
        .add_header(header::AUTHORIZATION, app.auth_header(&alice.token))
        .json(&json!({ "name": "Home" }))
        .await;
    let created: Value = response.json();
    let path = format!("/api/categories/{}", created["id"]);

    let response = app
        .server
        .put(&path)
        .add_header(header::AUTHORIZATION, app.auth_header(&alice.token))
        .json(&json!({ "name": "House", "color": "#000000" }))
        .await;
    let body: Value = response.json();
    assert_eq!(body["name"], "House");
    assert_eq!(body["color"], "#000000");

    let response = app
        .server
        .put(&path)
        .add_header(header::AUTHORIZATION, app.auth_header(&bob.token))
        .json(&json!({ "name": "Hijacked" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_in_use_category_is_refused() {
    let app = TestApp::spawn();
    let alice = app.create_user("alice").await;
    let category = unwrap_ok!(
        app.store
            .insert_category(NewCategory {
                name: "Work".to_string(),
                color: "#123456".to_string(),
                user_id: Some(alice.id()),
                created_at: Utc::now(),
            })
            .await
    );
    let mut input = TaskInput::titled("Report");
    input.category_id = Some(category.id);
    let task = unwrap_ok!(
        app.store
            .insert_task(NewTask::from_input(alice.id(), input, Utc::now()))
            .await
    );
    let path = format!("/api/categories/{}", category.id);

    let response = app
        .server
        .delete(&path)
        .add_header(header::AUTHORIZATION, app.auth_header(&alice.token))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    assert!(unwrap_ok!(app.store.delete_task(alice.id(), task.id).await));
    app.server
        .delete(&path)
        .add_header(header::AUTHORIZATION, app.auth_header(&alice.token))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_global_category_cannot_be_deleted() {
    let app = TestApp::spawn();
    let alice = app.create_user("alice").await;
    let global = unwrap_ok!(
        app.store
            .insert_category(NewCategory {
                name: "Shared".to_string(),
                color: "#123456".to_string(),
                user_id: None,
                created_at: Utc::now(),
            })
            .await
    );

    let response = app
        .server
        .delete(&format!("/api/categories/{}", global.id))
        .add_header(header::AUTHORIZATION, app.auth_header(&alice.token))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}
