/// TaskHub Web - Live connection wire messages.
///
/// Outbound frames are tagged JSON objects. Inbound frames are parsed
/// leniently and anything without a known `type` is dropped.
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::notification::NotificationPayload;
use crate::error::{AppError, AppResult};

/// Server to client message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PushMessage {
    UnreadCount { count: i64 },
    SendNotification { notification: NotificationPayload },
}

impl PushMessage {
    pub fn unread_count(count: i64) -> Self {
        Self::UnreadCount { count }
    }

    pub fn to_json(&self) -> AppResult<String> {
        serde_json::to_string(self)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to encode push message: {e}")))
    }
}

/// Client to server command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCommand {
    /// `notification_id` is `None` when the frame carries no usable id; the
    /// command is still answered with the unread count.
    MarkAsRead { notification_id: Option<i32> },
    MarkAllAsRead,
}

impl ClientCommand {
    /// Parse an inbound text frame. Returns `None` for malformed JSON or a
    /// missing or unknown `type`.
    pub fn parse(text: &str) -> Option<Self> {
        let json: Value = serde_json::from_str(text).ok()?;
        match json.get("type")?.as_str()? {
            "mark_as_read" => Some(Self::MarkAsRead {
                notification_id: json.get("notification_id").and_then(notification_id),
            }),
            "mark_all_as_read" => Some(Self::MarkAllAsRead),
            _ => None,
        }
    }
}

/// Integer ids and numeric strings (`"5"`) are both accepted.
fn notification_id(value: &Value) -> Option<i32> {
    let id = match value {
        Value::Number(n) => n.as_i64()?,
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    i32::try_from(id).ok()
}
