/// TaskHub Web - Scheduled sweep jobs.
///
/// Each job is a plain async function over the store and the dispatcher, so
/// the server can run it on an interval and `run_job` can run it once.
pub mod cleanup;
pub mod due;
pub mod summary;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{error, info};

use crate::config::JobsConfig;
use crate::services::NotificationDispatcher;
use crate::store::Store;

pub use cleanup::cleanup_old_tasks;
pub use due::{SweepReport, check_due_tasks};
pub use summary::send_daily_summary;

/// Job names accepted by `run_job`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    CheckDue,
    DailySummary,
    Cleanup,
}

impl JobKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "check-due" => Some(Self::CheckDue),
            "daily-summary" => Some(Self::DailySummary),
            "cleanup" => Some(Self::Cleanup),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CheckDue => "check-due",
            Self::DailySummary => "daily-summary",
            Self::Cleanup => "cleanup",
        }
    }
}

/// Run one job now and log its outcome.
pub async fn run_once(
    kind: JobKind,
    store: &dyn Store,
    dispatcher: &NotificationDispatcher,
    jobs: &JobsConfig,
) -> crate::error::AppResult<()> {
    let now = Utc::now();
    match kind {
        JobKind::CheckDue => {
            check_due_tasks(store, dispatcher, now, jobs.due_soon_window()).await?;
        }
        JobKind::DailySummary => {
            send_daily_summary(store, dispatcher, now).await?;
        }
        JobKind::Cleanup => {
            cleanup_old_tasks(store, now, jobs.task_retention()).await?;
        }
    }
    Ok(())
}

/// Spawn one interval loop per job. Returns no handles when jobs are
/// disabled.
pub fn start_background_jobs(
    store: Arc<dyn Store>,
    dispatcher: NotificationDispatcher,
    jobs: &JobsConfig,
) -> Vec<JoinHandle<()>> {
    if !jobs.enabled {
        info!("Background jobs disabled");
        return Vec::new();
    }

    let schedule = [
        (JobKind::CheckDue, jobs.due_check_interval()),
        (JobKind::DailySummary, jobs.daily_summary_interval()),
        (JobKind::Cleanup, jobs.cleanup_interval()),
    ];

    let handles = schedule
        .into_iter()
        .map(|(kind, every)| {
            let store = Arc::clone(&store);
            let dispatcher = dispatcher.clone();
            let jobs = jobs.clone();
            tokio::spawn(async move { job_loop(kind, every, store, dispatcher, jobs).await })
        })
        .collect();

    info!(
        due_check_secs = jobs.due_check_interval().as_secs(),
        daily_summary_secs = jobs.daily_summary_interval().as_secs(),
        cleanup_secs = jobs.cleanup_interval().as_secs(),
        "Background jobs started"
    );
    handles
}

async fn job_loop(
    kind: JobKind,
    every: Duration,
    store: Arc<dyn Store>,
    dispatcher: NotificationDispatcher,
    jobs: JobsConfig,
) {
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // Skip the immediate first tick; jobs run one full period after startup.
    ticker.tick().await;

    loop {
        ticker.tick().await;
        if let Err(e) = run_once(kind, &*store, &dispatcher, &jobs).await {
            error!(job = kind.as_str(), error = %e, "Background job failed");
        }
    }
}
