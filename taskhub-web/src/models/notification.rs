/// TaskHub Web - Notification model.
///
/// A notification belongs to exactly one recipient. `read_at` is set once,
/// on the transition from unread to read, and is `None` while unread.
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::notifications;

/// Icon shown for a stored kind that is no longer recognised.
pub const DEFAULT_ICON: &str = "fas fa-bell";

/// Timestamp format used in push payloads (UTC).
pub const PUSH_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Notification category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    TaskCreated,
    TaskUpdated,
    TaskCompleted,
    TaskDue,
    TaskOverdue,
    TaskAssigned,
    System,
}

impl NotificationKind {
    pub const ALL: [NotificationKind; 7] = [
        Self::TaskCreated,
        Self::TaskUpdated,
        Self::TaskCompleted,
        Self::TaskDue,
        Self::TaskOverdue,
        Self::TaskAssigned,
        Self::System,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TaskCreated => "task_created",
            Self::TaskUpdated => "task_updated",
            Self::TaskCompleted => "task_completed",
            Self::TaskDue => "task_due",
            Self::TaskOverdue => "task_overdue",
            Self::TaskAssigned => "task_assigned",
            Self::System => "system",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == s)
    }

    /// CSS icon classes for the client.
    pub fn icon(&self) -> &'static str {
        match self {
            Self::TaskCreated => "fas fa-plus-circle text-primary",
            Self::TaskUpdated => "fas fa-edit text-info",
            Self::TaskCompleted => "fas fa-check-circle text-success",
            Self::TaskDue => "fas fa-clock text-warning",
            Self::TaskOverdue => "fas fa-exclamation-triangle text-danger",
            Self::TaskAssigned => "fas fa-user-plus text-primary",
            Self::System => "fas fa-cog text-secondary",
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Notification database model.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = notifications)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Notification {
    pub id: i32,
    pub user_id: i32,
    pub notification_type: String,
    pub title: String,
    pub message: String,
    pub related_task_id: Option<i32>,
    pub related_url: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

impl Notification {
    pub fn kind(&self) -> Option<NotificationKind> {
        NotificationKind::parse(&self.notification_type)
    }

    pub fn icon(&self) -> &'static str {
        self.kind().map_or(DEFAULT_ICON, |kind| kind.icon())
    }

    /// Mark as read if still unread. Returns whether the row changed.
    pub fn mark_read(&mut self, now: DateTime<Utc>) -> bool {
        if self.is_read {
            return false;
        }
        self.is_read = true;
        self.read_at = Some(now);
        true
    }

    /// Shape pushed to live connections.
    pub fn payload(&self) -> NotificationPayload {
        NotificationPayload {
            id: self.id,
            kind: self.notification_type.clone(),
            title: self.title.clone(),
            message: self.message.clone(),
            icon: self.icon().to_string(),
            related_url: self.related_url.clone().unwrap_or_default(),
            created_at: self.created_at.format(PUSH_TIMESTAMP_FORMAT).to_string(),
            is_read: self.is_read,
        }
    }
}

/// New notification for insertion. Always starts unread.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = notifications)]
pub struct NewNotification {
    pub user_id: i32,
    pub notification_type: String,
    pub title: String,
    pub message: String,
    pub related_task_id: Option<i32>,
    pub related_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewNotification {
    pub fn new(
        user_id: i32,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            notification_type: kind.as_str().to_string(),
            title: title.into(),
            message: message.into(),
            related_task_id: None,
            related_url: None,
            created_at: Utc::now(),
        }
    }

    /// Link the notification to a task and the URL the client should open.
    pub fn with_related(mut self, task_id: i32, url: impl Into<String>) -> Self {
        self.related_task_id = Some(task_id);
        self.related_url = Some(url.into());
        self
    }
}

/// Notification as carried by a `send_notification` push.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub id: i32,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub message: String,
    pub icon: String,
    pub related_url: String,
    pub created_at: String,
    pub is_read: bool,
}

/// Notification as returned by the HTTP API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationDto {
    pub id: i32,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub message: String,
    pub icon: String,
    pub related_task_id: Option<i32>,
    pub related_url: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

impl From<Notification> for NotificationDto {
    fn from(n: Notification) -> Self {
        let icon = n.icon().to_string();
        Self {
            id: n.id,
            kind: n.notification_type,
            title: n.title,
            message: n.message,
            icon,
            related_task_id: n.related_task_id,
            related_url: n.related_url,
            is_read: n.is_read,
            created_at: n.created_at,
            read_at: n.read_at,
        }
    }
}
