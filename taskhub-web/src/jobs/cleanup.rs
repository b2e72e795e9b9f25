/// TaskHub Web - Old task cleanup.
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use crate::error::AppResult;
use crate::store::TaskStore;

/// Delete tasks created more than `retention` before `now`.
pub async fn cleanup_old_tasks<S>(
    tasks: &S,
    now: DateTime<Utc>,
    retention: Duration,
) -> AppResult<usize>
where
    S: TaskStore + ?Sized,
{
    let cutoff = now - retention;
    let deleted = tasks.delete_tasks_created_before(cutoff).await?;
    if deleted > 0 {
        info!(deleted, cutoff = %cutoff, "Cleaned up old tasks");
    } else {
        debug!("No old tasks to clean up");
    }
    Ok(deleted)
}
