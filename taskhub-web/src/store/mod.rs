/// TaskHub Web - Persistence boundary.
///
/// Every store operation is async and scoped to the acting user where a user
/// is involved. Two implementations share this surface: `PgStore`
/// (diesel-async over a deadpool pool) and `MemoryStore`.
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::AppResult;
use crate::models::{
    Category, NewCategory, NewNotification, NewTask, NewUser, Notification, Page, PageRequest,
    Task, TaskQuery, TaskStats, User,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Result of marking a single notification read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// The notification was unread and is now read.
    Marked,
    /// The notification was already read; nothing changed.
    AlreadyRead,
    /// No notification with that id belongs to the user.
    NotFound,
}

impl ReadOutcome {
    pub fn is_found(&self) -> bool {
        !matches!(self, Self::NotFound)
    }
}

#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn insert_notification(&self, new: NewNotification) -> AppResult<Notification>;

    /// Newest first.
    async fn list_notifications(
        &self,
        user_id: i32,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<Notification>>;

    async fn unread_count(&self, user_id: i32) -> AppResult<i64>;

    /// Single conditional update: only an unread row owned by `user_id`
    /// changes, and `read_at` is written in the same statement.
    async fn mark_read(
        &self,
        user_id: i32,
        notification_id: i32,
        now: DateTime<Utc>,
    ) -> AppResult<ReadOutcome>;

    /// Returns the number of rows that changed.
    async fn mark_all_read(&self, user_id: i32, now: DateTime<Utc>) -> AppResult<usize>;

    async fn delete_notification(&self, user_id: i32, notification_id: i32) -> AppResult<bool>;

    async fn clear_notifications(&self, user_id: i32) -> AppResult<usize>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert_user(&self, new: NewUser) -> AppResult<User>;

    async fn find_user(&self, user_id: i32) -> AppResult<Option<User>>;

    /// Active users ordered by id.
    async fn active_users(&self) -> AppResult<Vec<User>>;
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn insert_task(&self, new: NewTask) -> AppResult<Task>;

    async fn find_task(&self, user_id: i32, task_id: i32) -> AppResult<Option<Task>>;

    /// Filtered tasks of one user, newest first. The requested page is
    /// clamped into range.
    async fn list_tasks(&self, user_id: i32, query: &TaskQuery) -> AppResult<Page<Task>>;

    /// Persist every editable column of an existing task.
    async fn save_task(&self, task: &Task) -> AppResult<Task>;

    async fn delete_task(&self, user_id: i32, task_id: i32) -> AppResult<bool>;

    async fn task_stats(&self, user_id: i32, now: DateTime<Utc>) -> AppResult<TaskStats>;

    /// Pending or in-progress tasks of all users with `after < due_date <= until`.
    async fn open_tasks_due_between(
        &self,
        after: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> AppResult<Vec<Task>>;

    /// Pending or in-progress tasks of all users with `due_date < now`.
    async fn open_tasks_overdue(&self, now: DateTime<Utc>) -> AppResult<Vec<Task>>;

    async fn delete_tasks_created_before(&self, cutoff: DateTime<Utc>) -> AppResult<usize>;
}

#[async_trait]
pub trait CategoryStore: Send + Sync {
    async fn insert_category(&self, new: NewCategory) -> AppResult<Category>;

    /// The user's own categories plus global ones, by name.
    async fn visible_categories(&self, user_id: i32) -> AppResult<Vec<Category>>;

    async fn find_visible_category(
        &self,
        user_id: i32,
        category_id: i32,
    ) -> AppResult<Option<Category>>;

    async fn save_category(&self, category: &Category) -> AppResult<Category>;

    /// Deletes only a category owned by `user_id`.
    async fn delete_category(&self, user_id: i32, category_id: i32) -> AppResult<bool>;

    async fn category_in_use(&self, category_id: i32) -> AppResult<bool>;
}

/// Everything the application persists.
#[async_trait]
pub trait Store: NotificationStore + UserStore + TaskStore + CategoryStore {
    /// Cheap round trip used by the health endpoint.
    async fn health_check(&self) -> AppResult<()>;
}

pub(crate) fn page_window(page: PageRequest, total: i64) -> (i64, i64) {
    let (_, _, offset) = page.resolve(total);
    (offset, page.per_page())
}
