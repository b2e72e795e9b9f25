/// TaskHub Web - Live WebSocket tests.
///
/// Real clients connect to a served application. Replies and pushes may
/// interleave, so helpers wait for a message of a given type.
use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use taskhub_web::models::{NewNotification, NotificationKind};
use taskhub_web::services::ChannelKey;
use taskhub_web::store::NotificationStore;

use crate::common::{TestApp, TestUser, unwrap_ok, unwrap_some};
use crate::fixtures::create_notification;

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const WAIT: Duration = Duration::from_secs(5);

async fn connect(addr: SocketAddr, user: &TestUser) -> Client {
    let mut request = unwrap_ok!(format!("ws://{addr}/ws/notifications").into_client_request());
    request.headers_mut().insert(
        "Authorization",
        unwrap_ok!(HeaderValue::from_str(&format!("Bearer {}", user.token))),
    );
    let (client, _response) = unwrap_ok!(connect_async(request).await);
    client
}

/// Next text frame as JSON, skipping control frames.
async fn next_json(client: &mut Client) -> Value {
    loop {
        let frame = unwrap_some!(unwrap_ok!(timeout(WAIT, client.next()).await));
        match unwrap_ok!(frame) {
            Message::Text(text) => return unwrap_ok!(serde_json::from_str(&text)),
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("unexpected frame: {other:?}"),
        }
    }
}

/// Next message whose `type` is `kind`, discarding others.
async fn next_of_type(client: &mut Client, kind: &str) -> Value {
    loop {
        let message = next_json(client).await;
        if message["type"] == kind {
            return message;
        }
    }
}

async fn send(client: &mut Client, message: Value) {
    unwrap_ok!(client.send(Message::Text(message.to_string())).await);
}

async fn wait_for_connections(app: &TestApp, user_id: i32, expected: usize) {
    let key = ChannelKey::user(user_id);
    for _ in 0..100 {
        if app.state.channels.group_size(&key) == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!(
        "expected {expected} connections, found {}",
        app.state.channels.group_size(&key)
    );
}

// ==================== Handshake Tests ====================

#[tokio::test]
async fn test_connect_sends_unread_snapshot() {
    let app = TestApp::spawn();
    let addr = app.serve().await;
    let alice = app.create_user("alice").await;
    create_notification(&app, alice.id(), "a").await;
    create_notification(&app, alice.id(), "b").await;

    let mut client = connect(addr, &alice).await;
    let snapshot = next_json(&mut client).await;
    assert_eq!(snapshot, json!({ "type": "unread_count", "count": 2 }));
}

#[tokio::test]
async fn test_connect_without_token_is_rejected() {
    let app = TestApp::spawn();
    let addr = app.serve().await;

    let result = connect_async(format!("ws://{addr}/ws/notifications")).await;
    match result {
        Err(tungstenite::Error::Http(response)) => assert_eq!(response.status(), 401),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("unauthenticated handshake succeeded"),
    }
    assert_eq!(app.state.channels.total_connections(), 0);
}

// ==================== Command Tests ====================

#[tokio::test]
async fn test_mark_as_read_replies_with_count() {
    let app = TestApp::spawn();
    let addr = app.serve().await;
    let alice = app.create_user("alice").await;
    let first = create_notification(&app, alice.id(), "a").await;
    create_notification(&app, alice.id(), "b").await;

    let mut client = connect(addr, &alice).await;
    next_of_type(&mut client, "unread_count").await;

    send(&mut client, json!({ "type": "mark_as_read", "notification_id": first.id })).await;
    let reply = next_of_type(&mut client, "unread_count").await;
    assert_eq!(reply["count"], 1);

    let rows = unwrap_ok!(app.store.list_notifications(alice.id(), 10, 0).await);
    let marked = unwrap_some!(rows.iter().find(|n| n.id == first.id));
    assert!(marked.is_read);
    assert!(marked.read_at.is_some());
}

#[tokio::test]
async fn test_mark_all_as_read_replies_zero() {
    let app = TestApp::spawn();
    let addr = app.serve().await;
    let alice = app.create_user("alice").await;
    for title in ["a", "b", "c"] {
        create_notification(&app, alice.id(), title).await;
    }

    let mut client = connect(addr, &alice).await;
    next_of_type(&mut client, "unread_count").await;

    send(&mut client, json!({ "type": "mark_all_as_read" })).await;
    let reply = next_of_type(&mut client, "unread_count").await;
    assert_eq!(reply["count"], 0);
    assert_eq!(unwrap_ok!(app.store.unread_count(alice.id()).await), 0);
}

#[tokio::test]
async fn test_garbage_is_ignored_and_connection_stays_open() {
    let app = TestApp::spawn();
    let addr = app.serve().await;
    let alice = app.create_user("alice").await;
    create_notification(&app, alice.id(), "a").await;

    let mut client = connect(addr, &alice).await;
    next_of_type(&mut client, "unread_count").await;

    unwrap_ok!(client.send(Message::Text("not json".to_string())).await);
    send(&mut client, json!({ "type": "subscribe" })).await;
    send(&mut client, json!({ "type": "mark_all_as_read" })).await;

    // The only reply is for the valid command.
    let reply = next_json(&mut client).await;
    assert_eq!(reply, json!({ "type": "unread_count", "count": 0 }));
}

#[tokio::test]
async fn test_mark_as_read_without_id_replies_with_count() {
    let app = TestApp::spawn();
    let addr = app.serve().await;
    let alice = app.create_user("alice").await;
    create_notification(&app, alice.id(), "a").await;

    let mut client = connect(addr, &alice).await;
    next_of_type(&mut client, "unread_count").await;

    send(&mut client, json!({ "type": "mark_as_read" })).await;
    let reply = next_json(&mut client).await;
    assert_eq!(reply, json!({ "type": "unread_count", "count": 1 }));
}

#[tokio::test]
async fn test_foreign_notification_is_untouched() {
    let app = TestApp::spawn();
    let addr = app.serve().await;
    let alice = app.create_user("alice").await;
    let bob = app.create_user("bob").await;
    let bobs = create_notification(&app, bob.id(), "private").await;

    let mut client = connect(addr, &alice).await;
    next_of_type(&mut client, "unread_count").await;

    send(&mut client, json!({ "type": "mark_as_read", "notification_id": bobs.id })).await;
    let reply = next_of_type(&mut client, "unread_count").await;
    assert_eq!(reply["count"], 0);
    assert_eq!(unwrap_ok!(app.store.unread_count(bob.id()).await), 1);
}

// ==================== Multi-tab Tests ====================

#[tokio::test]
async fn test_push_reaches_every_tab() {
    let app = TestApp::spawn();
    let addr = app.serve().await;
    let alice = app.create_user("alice").await;

    let mut tab1 = connect(addr, &alice).await;
    let mut tab2 = connect(addr, &alice).await;
    next_of_type(&mut tab1, "unread_count").await;
    next_of_type(&mut tab2, "unread_count").await;

    let sent = unwrap_ok!(
        app.state
            .dispatcher
            .notify(NewNotification::new(
                alice.id(),
                NotificationKind::System,
                "Maintenance",
                "Tonight",
            ))
            .await
    );

    for tab in [&mut tab1, &mut tab2] {
        let push = next_of_type(tab, "send_notification").await;
        let notification = &push["notification"];
        assert_eq!(notification["id"], sent.id);
        assert_eq!(notification["type"], "system");
        assert_eq!(notification["title"], "Maintenance");
        assert_eq!(notification["related_url"], "");
        assert_eq!(notification["is_read"], false);
        let created_at = unwrap_some!(notification["created_at"].as_str());
        assert_eq!(created_at.len(), "YYYY-MM-DD HH:MM:SS".len());
    }
}

#[tokio::test]
async fn test_second_tab_sees_first_tabs_mark() {
    let app = TestApp::spawn();
    let addr = app.serve().await;
    let alice = app.create_user("alice").await;
    let first = create_notification(&app, alice.id(), "a").await;
    create_notification(&app, alice.id(), "b").await;

    let mut tab1 = connect(addr, &alice).await;
    let mut tab2 = connect(addr, &alice).await;
    next_of_type(&mut tab1, "unread_count").await;
    next_of_type(&mut tab2, "unread_count").await;

    send(&mut tab1, json!({ "type": "mark_as_read", "notification_id": first.id })).await;
    assert_eq!(next_of_type(&mut tab1, "unread_count").await["count"], 1);

    send(&mut tab2, json!({ "type": "mark_as_read", "notification_id": first.id })).await;
    assert_eq!(next_of_type(&mut tab2, "unread_count").await["count"], 1);
}

#[tokio::test]
async fn test_push_is_isolated_per_user() {
    let app = TestApp::spawn();
    let addr = app.serve().await;
    let alice = app.create_user("alice").await;
    let bob = app.create_user("bob").await;

    let mut bob_client = connect(addr, &bob).await;
    next_of_type(&mut bob_client, "unread_count").await;

    unwrap_ok!(
        app.state
            .dispatcher
            .notify(NewNotification::new(alice.id(), NotificationKind::System, "For alice", "x"))
            .await
    );
    unwrap_ok!(
        app.state
            .dispatcher
            .notify(NewNotification::new(bob.id(), NotificationKind::System, "For bob", "y"))
            .await
    );

    // Bob's first push is his own; alice's was never queued for him.
    let push = next_of_type(&mut bob_client, "send_notification").await;
    assert_eq!(push["notification"]["title"], "For bob");
}

// ==================== Disconnect Tests ====================

#[tokio::test]
async fn test_disconnect_leaves_group() {
    let app = TestApp::spawn();
    let addr = app.serve().await;
    let alice = app.create_user("alice").await;

    let mut tab1 = connect(addr, &alice).await;
    let tab2 = connect(addr, &alice).await;
    next_of_type(&mut tab1, "unread_count").await;
    wait_for_connections(&app, alice.id(), 2).await;

    drop(tab2);
    wait_for_connections(&app, alice.id(), 1).await;

    unwrap_ok!(tab1.close(None).await);
    wait_for_connections(&app, alice.id(), 0).await;
}

#[tokio::test]
async fn test_shutdown_closes_live_connections() {
    let app = TestApp::spawn();
    let addr = app.serve().await;
    let alice = app.create_user("alice").await;

    let mut client = connect(addr, &alice).await;
    next_of_type(&mut client, "unread_count").await;

    app.state.channels.shutdown();

    // The server closes the socket; the stream ends or yields a close frame.
    loop {
        match timeout(WAIT, client.next()).await {
            Ok(None) | Ok(Some(Err(_))) | Ok(Some(Ok(Message::Close(_)))) => break,
            Ok(Some(Ok(_))) => continue,
            Err(_) => panic!("connection still open after shutdown"),
        }
    }
}
