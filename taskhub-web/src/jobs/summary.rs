/// TaskHub Web - Daily digest.
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::error::AppResult;
use crate::models::{NewNotification, NotificationKind, TaskStats};
use crate::services::dispatcher::{BatchReport, NotificationDispatcher};
use crate::store::{TaskStore, UserStore};

pub const SUMMARY_TITLE: &str = "Daily Task Summary";

/// Digest text for one user's counters.
pub fn summary_message(stats: &TaskStats) -> String {
    let mut message = format!("You have {} pending tasks", stats.pending);
    if stats.overdue > 0 {
        message.push_str(&format!(" and {} overdue tasks", stats.overdue));
    }
    message
}

/// Send every active user a system notification with their pending and
/// overdue counts. A user whose counters or notification fail is recorded in
/// `failed` and the rest still get theirs.
pub async fn send_daily_summary<S>(
    store: &S,
    dispatcher: &NotificationDispatcher,
    now: DateTime<Utc>,
) -> AppResult<BatchReport>
where
    S: TaskStore + UserStore + ?Sized,
{
    let users = store.active_users().await?;
    let mut requests = Vec::with_capacity(users.len());
    let mut failed = Vec::new();

    for user in &users {
        match store.task_stats(user.id, now).await {
            Ok(stats) => requests.push(NewNotification::new(
                user.id,
                NotificationKind::System,
                SUMMARY_TITLE,
                summary_message(&stats),
            )),
            Err(e) => {
                warn!(user_id = user.id, error = %e, "Failed to count tasks for summary");
                failed.push(user.id);
            }
        }
    }

    let mut report = dispatcher.notify_each(requests).await;
    report.failed.extend(failed);

    info!(
        users = users.len(),
        delivered = report.delivered_count(),
        failed = report.failed_count(),
        "Daily summary sent"
    );
    Ok(report)
}
