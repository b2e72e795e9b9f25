/// TaskHub Web - Channel layer.
///
/// Maps a channel key (`user:<id>`) to the set of live connections joined to
/// it. Each connection owns a bounded outbound queue; `publish` enqueues the
/// event on every member present at call time and never waits.
///
/// The registry lock is a synchronous `parking_lot::RwLock`: no operation
/// holds it across an await, and `Membership` must be able to leave from
/// `Drop`.
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};
use uuid::Uuid;

/// Group key for a user's live connections.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelKey(String);

impl ChannelKey {
    pub fn user(user_id: i32) -> Self {
        Self(format!("user:{}", user_id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ChannelKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Sending half of a live connection's outbound queue.
#[derive(Debug, Clone)]
pub struct Connection {
    id: Uuid,
    sender: mpsc::Sender<String>,
}

impl Connection {
    /// Create a connection and the receiver its transport drains.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<String>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (
            Self {
                id: Uuid::new_v4(),
                sender,
            },
            receiver,
        )
    }

    pub fn id(&self) -> Uuid {
        self.id
    }
}

type Groups = HashMap<ChannelKey, HashMap<Uuid, mpsc::Sender<String>>>;

/// Registry of channel groups. Cloning shares the same registry.
#[derive(Clone, Default)]
pub struct ChannelLayer {
    groups: Arc<RwLock<Groups>>,
}

impl ChannelLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `connection` to the group. Joining twice with the same connection
    /// keeps a single membership.
    pub fn join(&self, key: &ChannelKey, connection: Connection) -> Membership {
        let id = connection.id;
        let size = {
            let mut groups = self.groups.write();
            let group = groups.entry(key.clone()).or_default();
            group.insert(id, connection.sender);
            group.len()
        };

        debug!(channel = %key, connection_id = %id, group_size = size, "Connection joined");

        Membership {
            layer: self.clone(),
            key: key.clone(),
            connection_id: id,
            released: false,
        }
    }

    /// Remove a connection from the group. Returns whether it was a member.
    pub fn leave(&self, key: &ChannelKey, connection_id: Uuid) -> bool {
        let mut groups = self.groups.write();
        let Some(group) = groups.get_mut(key) else {
            return false;
        };
        let removed = group.remove(&connection_id).is_some();
        if group.is_empty() {
            groups.remove(key);
        }
        if removed {
            debug!(channel = %key, connection_id = %connection_id, "Connection left");
        }
        removed
    }

    /// Deliver `event` to every current member of the group.
    /// Returns the number of connections that accepted it.
    pub fn publish(&self, key: &ChannelKey, event: &str) -> usize {
        let groups = self.groups.read();
        let Some(group) = groups.get(key) else {
            return 0;
        };

        let mut delivered = 0;
        for (id, sender) in group {
            match sender.try_send(event.to_string()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    warn!(
                        channel = %key,
                        connection_id = %id,
                        "Outbound queue full, event dropped"
                    );
                }
                Err(TrySendError::Closed(_)) => {
                    debug!(channel = %key, connection_id = %id, "Connection closed before leaving");
                }
            }
        }
        delivered
    }

    pub fn group_size(&self, key: &ChannelKey) -> usize {
        self.groups.read().get(key).map_or(0, HashMap::len)
    }

    pub fn contains(&self, key: &ChannelKey, connection_id: Uuid) -> bool {
        self.groups
            .read()
            .get(key)
            .is_some_and(|group| group.contains_key(&connection_id))
    }

    pub fn total_connections(&self) -> usize {
        self.groups.read().values().map(HashMap::len).sum()
    }

    /// Drop every membership. Outbound queues close once their last sender
    /// is gone, which ends each live connection.
    pub fn shutdown(&self) {
        let drained = std::mem::take(&mut *self.groups.write());
        let connections: usize = drained.values().map(HashMap::len).sum();
        debug!(groups = drained.len(), connections, "Channel layer shut down");
    }
}

/// A connection's place in a group. Leaves the group when released or
/// dropped, so a cancelled handler still deregisters.
#[derive(Debug)]
pub struct Membership {
    layer: ChannelLayer,
    key: ChannelKey,
    connection_id: Uuid,
    released: bool,
}

impl Membership {
    pub fn key(&self) -> &ChannelKey {
        &self.key
    }

    pub fn connection_id(&self) -> Uuid {
        self.connection_id
    }

    /// Leave the group now. Safe to call more than once.
    pub fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.layer.leave(&self.key, self.connection_id);
        }
    }
}

impl Drop for Membership {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for ChannelLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelLayer")
            .field("groups", &self.groups.read().len())
            .field("connections", &self.total_connections())
            .finish()
    }
}
