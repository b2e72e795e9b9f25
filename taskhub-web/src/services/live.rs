/// TaskHub Web - Live notification connection.
///
/// Transport-independent state machine behind `/ws/notifications`:
///
/// ```text
/// CONNECTING --open(Some(user))--> OPEN --close()--> CLOSED
///      \--------open(None)---------------------------^
/// ```
///
/// While OPEN the connection is a member of its user's channel group and
/// answers `mark_as_read` / `mark_all_as_read` with the unread count.
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::channels::{ChannelKey, ChannelLayer, Connection, Membership};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::models::{ClientCommand, PushMessage};
use crate::store::NotificationStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
}

/// Handed to the transport once the connection is open.
#[derive(Debug)]
pub struct OpenedConnection {
    /// Events published to the user's group, in publish order.
    pub outbound: mpsc::Receiver<String>,
    /// Unread count at the time of joining.
    pub snapshot: PushMessage,
}

pub struct LiveConnection {
    state: ConnectionState,
    store: Arc<dyn NotificationStore>,
    channels: ChannelLayer,
    capacity: usize,
    user: Option<AuthUser>,
    membership: Option<Membership>,
}

impl LiveConnection {
    pub fn new(store: Arc<dyn NotificationStore>, channels: ChannelLayer, capacity: usize) -> Self {
        Self {
            state: ConnectionState::Connecting,
            store,
            channels,
            capacity,
            user: None,
            membership: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn user(&self) -> Option<&AuthUser> {
        self.user.as_ref()
    }

    /// Authenticate and join the user's group.
    ///
    /// Without an identity the connection goes straight to CLOSED and is
    /// never registered. The group is joined before the snapshot is read, so
    /// any notification stored afterwards is also pushed.
    pub async fn open(&mut self, identity: Option<AuthUser>) -> AppResult<OpenedConnection> {
        if self.state != ConnectionState::Connecting {
            return Err(AppError::Internal(anyhow::anyhow!(
                "live connection already left the connecting state"
            )));
        }

        let Some(user) = identity else {
            self.state = ConnectionState::Closed;
            warn!("Live connection rejected: no authenticated user");
            return Err(AppError::AuthenticationMissing);
        };

        let key = ChannelKey::user(user.id);
        let (connection, outbound) = Connection::new(self.capacity);
        let membership = self.channels.join(&key, connection);

        let count = match self.store.unread_count(user.id).await {
            Ok(count) => count,
            Err(e) => {
                self.state = ConnectionState::Closed;
                return Err(e);
            }
        };

        info!(
            user_id = user.id,
            connection_id = %membership.connection_id(),
            "Live connection opened"
        );

        self.membership = Some(membership);
        self.user = Some(user);
        self.state = ConnectionState::Open;

        Ok(OpenedConnection {
            outbound,
            snapshot: PushMessage::unread_count(count),
        })
    }

    /// Handle one inbound text frame. Returns the reply to send, if any.
    pub async fn handle_text(&mut self, text: &str) -> AppResult<Option<PushMessage>> {
        let Some(user_id) = self.open_user_id() else {
            return Ok(None);
        };

        let Some(command) = ClientCommand::parse(text) else {
            debug!(user_id, "Ignoring unrecognised client message");
            return Ok(None);
        };

        match command {
            ClientCommand::MarkAsRead { notification_id } => {
                match notification_id {
                    Some(notification_id) => {
                        let outcome = self
                            .store
                            .mark_read(user_id, notification_id, Utc::now())
                            .await?;
                        if !outcome.is_found() {
                            debug!(user_id, notification_id, "mark_as_read: unknown id");
                        }
                    }
                    None => debug!(user_id, "mark_as_read without a notification id"),
                }
                let count = self.store.unread_count(user_id).await?;
                Ok(Some(PushMessage::unread_count(count)))
            }
            ClientCommand::MarkAllAsRead => {
                let updated = self.store.mark_all_read(user_id, Utc::now()).await?;
                debug!(user_id, updated, "Marked all notifications read");
                Ok(Some(PushMessage::unread_count(0)))
            }
        }
    }

    /// Leave the group and move to CLOSED. Safe from any state.
    pub fn close(&mut self) {
        if let Some(mut membership) = self.membership.take() {
            membership.release();
            debug!(
                user_id = self.user.as_ref().map(|u| u.id),
                connection_id = %membership.connection_id(),
                "Live connection closed"
            );
        }
        self.state = ConnectionState::Closed;
    }

    fn open_user_id(&self) -> Option<i32> {
        match (self.state, &self.user) {
            (ConnectionState::Open, Some(user)) => Some(user.id),
            _ => None,
        }
    }
}
