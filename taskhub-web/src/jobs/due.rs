/// TaskHub Web - Due and overdue sweep.
use chrono::{DateTime, Duration, Utc};
use tracing::info;

use crate::error::AppResult;
use crate::services::dispatcher::{
    BatchReport, NotificationDispatcher, due_soon_notification, overdue_notification,
};
use crate::store::TaskStore;

/// Outcome of one `check_due_tasks` run.
#[derive(Debug, Default)]
pub struct SweepReport {
    pub due_soon: BatchReport,
    pub overdue: BatchReport,
}

impl SweepReport {
    pub fn notified(&self) -> usize {
        self.due_soon.delivered_count() + self.overdue.delivered_count()
    }

    pub fn failed(&self) -> usize {
        self.due_soon.failed_count() + self.overdue.failed_count()
    }
}

/// Notify every open task due within `(now, now + window]` as due soon and
/// every open task past its due date as overdue.
///
/// Nothing is remembered between runs: a task still matching on the next run
/// is notified again.
pub async fn check_due_tasks<S>(
    tasks: &S,
    dispatcher: &NotificationDispatcher,
    now: DateTime<Utc>,
    window: Duration,
) -> AppResult<SweepReport>
where
    S: TaskStore + ?Sized,
{
    let due_soon = tasks.open_tasks_due_between(now, now + window).await?;
    let overdue = tasks.open_tasks_overdue(now).await?;

    let report = SweepReport {
        due_soon: dispatcher
            .notify_each(due_soon.iter().map(due_soon_notification))
            .await,
        overdue: dispatcher
            .notify_each(overdue.iter().map(overdue_notification))
            .await,
    };

    info!(
        due_soon = report.due_soon.delivered_count(),
        overdue = report.overdue.delivered_count(),
        failed = report.failed(),
        "Due task sweep finished"
    );
    Ok(report)
}
