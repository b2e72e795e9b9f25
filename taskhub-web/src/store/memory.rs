/// TaskHub Web - In-memory store.
///
/// Backs the testing environment and database-less local runs. All tables
/// live behind one `tokio::sync::RwLock`, so each operation is atomic.
use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{
    CategoryStore, NotificationStore, ReadOutcome, Store, TaskStore, UserStore, page_window,
};
use crate::error::AppResult;
use crate::models::{
    Category, NewCategory, NewNotification, NewTask, NewUser, Notification, Page, Task, TaskQuery,
    TaskStats, TaskStatus, User,
};

#[derive(Default)]
struct Tables {
    users: BTreeMap<i32, User>,
    categories: BTreeMap<i32, Category>,
    tasks: BTreeMap<i32, Task>,
    notifications: BTreeMap<i32, Notification>,
    next_user_id: i32,
    next_category_id: i32,
    next_task_id: i32,
    next_notification_id: i32,
}

fn next_id(counter: &mut i32) -> i32 {
    *counter += 1;
    *counter
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn insert_notification(&self, new: NewNotification) -> AppResult<Notification> {
        let mut tables = self.tables.write().await;
        let notification = Notification {
            id: next_id(&mut tables.next_notification_id),
            user_id: new.user_id,
            notification_type: new.notification_type,
            title: new.title,
            message: new.message,
            related_task_id: new.related_task_id,
            related_url: new.related_url,
            is_read: false,
            created_at: new.created_at,
            read_at: None,
        };
        tables
            .notifications
            .insert(notification.id, notification.clone());
        Ok(notification)
    }

    async fn list_notifications(
        &self,
        user_id: i32,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<Notification>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<Notification> = tables
            .notifications
            .values()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(rows
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(0))
            .take(usize::try_from(limit).unwrap_or(0))
            .collect())
    }

    async fn unread_count(&self, user_id: i32) -> AppResult<i64> {
        let tables = self.tables.read().await;
        let count = tables
            .notifications
            .values()
            .filter(|n| n.user_id == user_id && !n.is_read)
            .count();
        Ok(count as i64)
    }

    async fn mark_read(
        &self,
        user_id: i32,
        notification_id: i32,
        now: DateTime<Utc>,
    ) -> AppResult<ReadOutcome> {
        let mut tables = self.tables.write().await;
        let outcome = match tables.notifications.get_mut(&notification_id) {
            Some(n) if n.user_id == user_id => {
                if n.mark_read(now) {
                    ReadOutcome::Marked
                } else {
                    ReadOutcome::AlreadyRead
                }
            }
            _ => ReadOutcome::NotFound,
        };
        Ok(outcome)
    }

    async fn mark_all_read(&self, user_id: i32, now: DateTime<Utc>) -> AppResult<usize> {
        let mut tables = self.tables.write().await;
        let updated = tables
            .notifications
            .values_mut()
            .filter(|n| n.user_id == user_id)
            .map(|n| n.mark_read(now))
            .filter(|changed| *changed)
            .count();
        Ok(updated)
    }

    async fn delete_notification(&self, user_id: i32, notification_id: i32) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        let owned = tables
            .notifications
            .get(&notification_id)
            .is_some_and(|n| n.user_id == user_id);
        if owned {
            tables.notifications.remove(&notification_id);
        }
        Ok(owned)
    }

    async fn clear_notifications(&self, user_id: i32) -> AppResult<usize> {
        let mut tables = self.tables.write().await;
        let before = tables.notifications.len();
        tables.notifications.retain(|_, n| n.user_id != user_id);
        Ok(before - tables.notifications.len())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, new: NewUser) -> AppResult<User> {
        let mut tables = self.tables.write().await;
        let user = User {
            id: next_id(&mut tables.next_user_id),
            username: new.username,
            email: new.email,
            is_active: new.is_active,
            date_joined: new.date_joined,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user(&self, user_id: i32) -> AppResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&user_id).cloned())
    }

    async fn active_users(&self) -> AppResult<Vec<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().filter(|u| u.is_active).cloned().collect())
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn insert_task(&self, new: NewTask) -> AppResult<Task> {
        let mut tables = self.tables.write().await;
        let task = Task {
            id: next_id(&mut tables.next_task_id),
            user_id: new.user_id,
            title: new.title,
            description: new.description,
            status: new.status,
            priority: new.priority,
            category_id: new.category_id,
            due_date: new.due_date,
            created_at: new.created_at,
            updated_at: new.updated_at,
            completed_at: new.completed_at,
        };
        tables.tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn find_task(&self, user_id: i32, task_id: i32) -> AppResult<Option<Task>> {
        let tables = self.tables.read().await;
        Ok(tables
            .tasks
            .get(&task_id)
            .filter(|t| t.user_id == user_id)
            .cloned())
    }

    async fn list_tasks(&self, user_id: i32, query: &TaskQuery) -> AppResult<Page<Task>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<Task> = tables
            .tasks
            .values()
            .filter(|t| t.user_id == user_id && query.matches(t))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let page = query.page_request();
        let total = rows.len() as i64;
        let (offset, limit) = page_window(page, total);
        let items = rows
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(0))
            .take(usize::try_from(limit).unwrap_or(0))
            .collect();
        Ok(page.into_page(items, total))
    }

    async fn save_task(&self, task: &Task) -> AppResult<Task> {
        let mut tables = self.tables.write().await;
        match tables.tasks.get_mut(&task.id) {
            Some(stored) => {
                *stored = task.clone();
                Ok(task.clone())
            }
            None => Err(diesel::result::Error::NotFound.into()),
        }
    }

    async fn delete_task(&self, user_id: i32, task_id: i32) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        let owned = tables
            .tasks
            .get(&task_id)
            .is_some_and(|t| t.user_id == user_id);
        if owned {
            tables.tasks.remove(&task_id);
        }
        Ok(owned)
    }

    async fn task_stats(&self, user_id: i32, now: DateTime<Utc>) -> AppResult<TaskStats> {
        let tables = self.tables.read().await;
        let rows = tables
            .tasks
            .values()
            .filter(|t| t.user_id == user_id)
            .map(|t| (t.status(), t.priority(), t.due_date));
        Ok(TaskStats::tally(rows, now))
    }

    async fn open_tasks_due_between(
        &self,
        after: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> AppResult<Vec<Task>> {
        let tables = self.tables.read().await;
        Ok(tables
            .tasks
            .values()
            .filter(|t| t.status().is_open())
            .filter(|t| t.due_date.is_some_and(|due| due > after && due <= until))
            .cloned()
            .collect())
    }

    async fn open_tasks_overdue(&self, now: DateTime<Utc>) -> AppResult<Vec<Task>> {
        let tables = self.tables.read().await;
        Ok(tables
            .tasks
            .values()
            .filter(|t| TaskStatus::OPEN.contains(&t.status()))
            .filter(|t| t.due_date.is_some_and(|due| due < now))
            .cloned()
            .collect())
    }

    async fn delete_tasks_created_before(&self, cutoff: DateTime<Utc>) -> AppResult<usize> {
        let mut tables = self.tables.write().await;
        let before = tables.tasks.len();
        tables.tasks.retain(|_, t| t.created_at >= cutoff);
        Ok(before - tables.tasks.len())
    }
}

#[async_trait]
impl CategoryStore for MemoryStore {
    async fn insert_category(&self, new: NewCategory) -> AppResult<Category> {
        let mut tables = self.tables.write().await;
        let category = Category {
            id: next_id(&mut tables.next_category_id),
            name: new.name,
            color: new.color,
            user_id: new.user_id,
            created_at: new.created_at,
        };
        tables.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn visible_categories(&self, user_id: i32) -> AppResult<Vec<Category>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<Category> = tables
            .categories
            .values()
            .filter(|c| c.is_visible_to(user_id))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn find_visible_category(
        &self,
        user_id: i32,
        category_id: i32,
    ) -> AppResult<Option<Category>> {
        let tables = self.tables.read().await;
        Ok(tables
            .categories
            .get(&category_id)
            .filter(|c| c.is_visible_to(user_id))
            .cloned())
    }

    async fn save_category(&self, category: &Category) -> AppResult<Category> {
        let mut tables = self.tables.write().await;
        match tables.categories.get_mut(&category.id) {
            Some(stored) => {
                *stored = category.clone();
                Ok(category.clone())
            }
            None => Err(diesel::result::Error::NotFound.into()),
        }
    }

    async fn delete_category(&self, user_id: i32, category_id: i32) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        let owned = tables
            .categories
            .get(&category_id)
            .is_some_and(|c| c.is_owned_by(user_id));
        if owned {
            tables.categories.remove(&category_id);
            for task in tables.tasks.values_mut() {
                if task.category_id == Some(category_id) {
                    task.category_id = None;
                }
            }
        }
        Ok(owned)
    }

    async fn category_in_use(&self, category_id: i32) -> AppResult<bool> {
        let tables = self.tables.read().await;
        Ok(tables
            .tasks
            .values()
            .any(|t| t.category_id == Some(category_id)))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn health_check(&self) -> AppResult<()> {
        Ok(())
    }
}
