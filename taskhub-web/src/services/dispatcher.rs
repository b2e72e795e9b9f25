/// TaskHub Web - Notification dispatcher.
///
/// `notify` persists first and publishes second. A store failure is returned
/// to the caller; a publish that reaches nobody is normal (the user is
/// offline) and never undoes the stored record.
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::channels::{ChannelKey, ChannelLayer};
use crate::error::{AppError, AppResult};
use crate::models::{NewNotification, Notification, NotificationKind, PushMessage, Task};
use crate::store::{NotificationStore, UserStore};

/// Outcome of a fan-out.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Notifications persisted (and published).
    pub delivered: Vec<Notification>,
    /// Recipients whose notification could not be persisted.
    pub failed: Vec<i32>,
}

impl BatchReport {
    pub fn delivered_count(&self) -> usize {
        self.delivered.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }
}

#[derive(Clone)]
pub struct NotificationDispatcher {
    notifications: Arc<dyn NotificationStore>,
    users: Arc<dyn UserStore>,
    channels: ChannelLayer,
}

impl NotificationDispatcher {
    pub fn new(
        notifications: Arc<dyn NotificationStore>,
        users: Arc<dyn UserStore>,
        channels: ChannelLayer,
    ) -> Self {
        Self {
            notifications,
            users,
            channels,
        }
    }

    /// Persist a notification for its recipient and push it to every live
    /// connection of that recipient.
    pub async fn notify(&self, new: NewNotification) -> AppResult<Notification> {
        if self.users.find_user(new.user_id).await?.is_none() {
            return Err(AppError::NotFound(format!("User {} not found", new.user_id)));
        }

        let notification = self.notifications.insert_notification(new).await?;
        self.publish(&notification);
        Ok(notification)
    }

    fn publish(&self, notification: &Notification) {
        let key = ChannelKey::user(notification.user_id);
        let message = PushMessage::SendNotification {
            notification: notification.payload(),
        };
        match message.to_json() {
            Ok(event) => {
                let connections = self.channels.publish(&key, &event);
                debug!(
                    notification_id = notification.id,
                    channel = %key,
                    connections,
                    "Notification published"
                );
            }
            Err(e) => warn!(
                notification_id = notification.id,
                error = %e,
                "Notification stored but not published"
            ),
        }
    }

    /// Notify each request independently; one failure never stops the rest.
    pub async fn notify_each<I>(&self, requests: I) -> BatchReport
    where
        I: IntoIterator<Item = NewNotification>,
    {
        let mut report = BatchReport::default();
        for new in requests {
            let user_id = new.user_id;
            match self.notify(new).await {
                Ok(notification) => report.delivered.push(notification),
                Err(e) => {
                    warn!(user_id, error = %e, "Notification failed for recipient");
                    report.failed.push(user_id);
                }
            }
        }
        report
    }

    /// Send the same notification to every active user.
    pub async fn notify_broadcast(
        &self,
        title: &str,
        message: &str,
        kind: NotificationKind,
    ) -> AppResult<BatchReport> {
        let users = self.users.active_users().await?;
        let report = self
            .notify_each(
                users
                    .iter()
                    .map(|user| NewNotification::new(user.id, kind, title, message)),
            )
            .await;

        info!(
            kind = %kind,
            delivered = report.delivered_count(),
            failed = report.failed_count(),
            "Broadcast notification sent"
        );
        Ok(report)
    }

    // ==================== Task Helpers ====================

    pub async fn notify_task_created(&self, task: &Task) -> AppResult<Notification> {
        self.notify(task_notification(
            task,
            NotificationKind::TaskCreated,
            "New Task Created",
            "has been created",
        ))
        .await
    }

    pub async fn notify_task_updated(&self, task: &Task) -> AppResult<Notification> {
        self.notify(task_notification(
            task,
            NotificationKind::TaskUpdated,
            "Task Updated",
            "has been updated",
        ))
        .await
    }

    pub async fn notify_task_completed(&self, task: &Task) -> AppResult<Notification> {
        self.notify(task_notification(
            task,
            NotificationKind::TaskCompleted,
            "Task Completed",
            "has been completed",
        ))
        .await
    }

    pub async fn notify_task_due_soon(&self, task: &Task) -> AppResult<Notification> {
        self.notify(due_soon_notification(task)).await
    }

    pub async fn notify_task_overdue(&self, task: &Task) -> AppResult<Notification> {
        self.notify(overdue_notification(task)).await
    }
}

fn task_notification(
    task: &Task,
    kind: NotificationKind,
    title: &str,
    verb: &str,
) -> NewNotification {
    NewNotification::new(
        task.user_id,
        kind,
        title,
        format!("Task \"{}\" {}.", task.title, verb),
    )
    .with_related(task.id, task.url())
}

pub fn due_soon_notification(task: &Task) -> NewNotification {
    task_notification(task, NotificationKind::TaskDue, "Task Due Soon", "is due soon")
}

pub fn overdue_notification(task: &Task) -> NewNotification {
    task_notification(task, NotificationKind::TaskOverdue, "Task Overdue", "is overdue")
}
