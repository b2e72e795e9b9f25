/// TaskHub Web - JSON API handlers.
///
/// Every handler requires an authenticated user and only touches that
/// user's rows (global categories excepted, which are read-only).
pub mod categories;
pub mod notifications;
pub mod tasks;

pub use categories::{create_category, delete_category, list_categories, update_category};
pub use notifications::{
    clear_notifications, delete_notification, list_notifications, mark_all_read, mark_read,
    unread_count,
};
pub use tasks::{
    complete_task, create_task, dashboard, delete_task, get_task, list_tasks, update_task,
};
