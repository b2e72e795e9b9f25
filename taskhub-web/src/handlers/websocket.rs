/// TaskHub Web - Notification WebSocket handler.
///
/// Thin transport around `LiveConnection`: authenticates before upgrading,
/// then multiplexes inbound frames, published events and keep-alive pings.
use std::time::Duration;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade, rejection::WebSocketUpgradeRejection},
    },
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt, stream::SplitSink};
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, info, warn};

use crate::AppState;
use crate::middleware::auth::OptionalAuthUser;
use crate::models::PushMessage;
use crate::services::live::{LiveConnection, OpenedConnection};

/// `GET /ws/notifications`.
///
/// An anonymous request gets 401 and is never registered, whether or not it
/// asked for an upgrade.
pub async fn notifications_ws(
    State(state): State<AppState>,
    OptionalAuthUser(user): OptionalAuthUser,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let mut live = LiveConnection::new(
        state.notifications.clone(),
        state.channels.clone(),
        state.config.websocket.channel_capacity,
    );

    let opened = match live.open(user).await {
        Ok(opened) => opened,
        Err(e) => return e.into_response(),
    };

    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => {
            live.close();
            return rejection.into_response();
        }
    };

    let ping_every = Duration::from_secs(state.config.websocket.ping_interval_secs);
    ws.on_upgrade(move |socket| run_connection(socket, live, opened, ping_every))
}

async fn run_connection(
    socket: WebSocket,
    mut live: LiveConnection,
    opened: OpenedConnection,
    ping_every: Duration,
) {
    let user_id = live.user().map(|u| u.id);
    let OpenedConnection {
        mut outbound,
        snapshot,
    } = opened;
    let (mut sender, mut receiver) = socket.split();

    if !send_push(&mut sender, &snapshot).await {
        warn!(?user_id, "Failed to send unread count snapshot");
        live.close();
        return;
    }

    let mut ping_interval = interval(ping_every);
    ping_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    ping_interval.tick().await;

    loop {
        tokio::select! {
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match live.handle_text(text.as_str()).await {
                            Ok(Some(reply)) => {
                                if !send_push(&mut sender, &reply).await {
                                    break;
                                }
                            }
                            Ok(None) => {}
                            Err(e) => {
                                error!(?user_id, error = %e, "Failed to handle client command")
                            }
                        }
                    }
                    Some(Ok(Message::Binary(_))) => {
                        debug!(?user_id, "Ignoring binary frame");
                    }
                    Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => {}
                    Some(Ok(Message::Close(_))) => {
                        info!(?user_id, "Client requested close");
                        break;
                    }
                    Some(Err(e)) => {
                        warn!(?user_id, error = %e, "WebSocket error");
                        break;
                    }
                    None => {
                        debug!(?user_id, "WebSocket stream ended");
                        break;
                    }
                }
            }

            event = outbound.recv() => {
                match event {
                    Some(text) => {
                        if sender.send(Message::Text(text.into())).await.is_err() {
                            break;
                        }
                    }
                    None => {
                        info!(?user_id, "Channel layer closed the connection");
                        break;
                    }
                }
            }

            _ = ping_interval.tick() => {
                if sender.send(Message::Ping(Vec::new().into())).await.is_err() {
                    warn!(?user_id, "Failed to send ping, closing");
                    break;
                }
            }
        }
    }

    live.close();
    if let Err(e) = sender.close().await {
        debug!(?user_id, error = %e, "WebSocket close handshake failed");
    }
}

async fn send_push(sender: &mut SplitSink<WebSocket, Message>, message: &PushMessage) -> bool {
    match message.to_json() {
        Ok(text) => sender.send(Message::Text(text.into())).await.is_ok(),
        Err(e) => {
            error!(error = %e, "Failed to encode push message");
            false
        }
    }
}
