/// TaskHub Web - PostgreSQL store.
///
/// Each call checks a connection out of the deadpool pool and runs one
/// diesel-async statement (two for reads that need a total or an existence
/// check). Nothing here blocks the runtime.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::dsl::exists;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::{
    CategoryStore, NotificationStore, ReadOutcome, Store, TaskStore, UserStore, page_window,
};
use crate::db::{DbPool, get_connection};
use crate::error::AppResult;
use crate::models::{
    Category, NewCategory, NewNotification, NewTask, NewUser, Notification, Page, Task,
    TaskPriority, TaskQuery, TaskStats, TaskStatus, User,
};
use crate::schema::{categories, notifications, tasks, users};

#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Every editable task column, `None` written as NULL.
#[derive(AsChangeset)]
#[diesel(table_name = tasks)]
#[diesel(treat_none_as_null = true)]
struct TaskChangeset<'a> {
    title: &'a str,
    description: &'a str,
    status: &'a str,
    priority: &'a str,
    category_id: Option<i32>,
    due_date: Option<DateTime<Utc>>,
    updated_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl<'a> From<&'a Task> for TaskChangeset<'a> {
    fn from(task: &'a Task) -> Self {
        Self {
            title: &task.title,
            description: &task.description,
            status: &task.status,
            priority: &task.priority,
            category_id: task.category_id,
            due_date: task.due_date,
            updated_at: task.updated_at,
            completed_at: task.completed_at,
        }
    }
}

#[derive(AsChangeset)]
#[diesel(table_name = categories)]
struct CategoryChangeset<'a> {
    name: &'a str,
    color: &'a str,
}

fn open_statuses() -> Vec<&'static str> {
    TaskStatus::OPEN.iter().map(TaskStatus::as_str).collect()
}

/// Escape `%`, `_` and `\` for use inside an ILIKE pattern.
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn filtered_tasks(user_id: i32, query: &TaskQuery) -> tasks::BoxedQuery<'static, Pg> {
    let mut statement = tasks::table
        .filter(tasks::user_id.eq(user_id))
        .into_boxed();
    if let Some(status) = query.status {
        statement = statement.filter(tasks::status.eq(status.as_str()));
    }
    if let Some(priority) = query.priority {
        statement = statement.filter(tasks::priority.eq(priority.as_str()));
    }
    if let Some(category_id) = query.category {
        statement = statement.filter(tasks::category_id.eq(category_id));
    }
    if let Some(term) = query.search_term() {
        let pattern = like_pattern(term);
        statement = statement.filter(
            tasks::title
                .ilike(pattern.clone())
                .or(tasks::description.ilike(pattern)),
        );
    }
    statement
}

#[async_trait]
impl NotificationStore for PgStore {
    async fn insert_notification(&self, new: NewNotification) -> AppResult<Notification> {
        let mut conn = get_connection(&self.pool).await?;
        let notification = diesel::insert_into(notifications::table)
            .values(&new)
            .returning(Notification::as_returning())
            .get_result(&mut conn)
            .await?;
        Ok(notification)
    }

    async fn list_notifications(
        &self,
        user_id: i32,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<Notification>> {
        let mut conn = get_connection(&self.pool).await?;
        let rows = notifications::table
            .filter(notifications::user_id.eq(user_id))
            .order((notifications::created_at.desc(), notifications::id.desc()))
            .limit(limit)
            .offset(offset)
            .select(Notification::as_select())
            .load(&mut conn)
            .await?;
        Ok(rows)
    }

    async fn unread_count(&self, user_id: i32) -> AppResult<i64> {
        let mut conn = get_connection(&self.pool).await?;
        let count = notifications::table
            .filter(notifications::user_id.eq(user_id))
            .filter(notifications::is_read.eq(false))
            .count()
            .get_result(&mut conn)
            .await?;
        Ok(count)
    }

    async fn mark_read(
        &self,
        user_id: i32,
        notification_id: i32,
        now: DateTime<Utc>,
    ) -> AppResult<ReadOutcome> {
        let mut conn = get_connection(&self.pool).await?;
        let updated = diesel::update(
            notifications::table
                .filter(notifications::id.eq(notification_id))
                .filter(notifications::user_id.eq(user_id))
                .filter(notifications::is_read.eq(false)),
        )
        .set((
            notifications::is_read.eq(true),
            notifications::read_at.eq(Some(now)),
        ))
        .execute(&mut conn)
        .await?;

        if updated > 0 {
            return Ok(ReadOutcome::Marked);
        }

        let owned = diesel::select(exists(
            notifications::table
                .filter(notifications::id.eq(notification_id))
                .filter(notifications::user_id.eq(user_id)),
        ))
        .get_result::<bool>(&mut conn)
        .await?;

        Ok(if owned {
            ReadOutcome::AlreadyRead
        } else {
            ReadOutcome::NotFound
        })
    }

    async fn mark_all_read(&self, user_id: i32, now: DateTime<Utc>) -> AppResult<usize> {
        let mut conn = get_connection(&self.pool).await?;
        let updated = diesel::update(
            notifications::table
                .filter(notifications::user_id.eq(user_id))
                .filter(notifications::is_read.eq(false)),
        )
        .set((
            notifications::is_read.eq(true),
            notifications::read_at.eq(Some(now)),
        ))
        .execute(&mut conn)
        .await?;
        Ok(updated)
    }

    async fn delete_notification(&self, user_id: i32, notification_id: i32) -> AppResult<bool> {
        let mut conn = get_connection(&self.pool).await?;
        let deleted = diesel::delete(
            notifications::table
                .filter(notifications::id.eq(notification_id))
                .filter(notifications::user_id.eq(user_id)),
        )
        .execute(&mut conn)
        .await?;
        Ok(deleted > 0)
    }

    async fn clear_notifications(&self, user_id: i32) -> AppResult<usize> {
        let mut conn = get_connection(&self.pool).await?;
        let deleted =
            diesel::delete(notifications::table.filter(notifications::user_id.eq(user_id)))
                .execute(&mut conn)
                .await?;
        Ok(deleted)
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, new: NewUser) -> AppResult<User> {
        let mut conn = get_connection(&self.pool).await?;
        let user = diesel::insert_into(users::table)
            .values(&new)
            .returning(User::as_returning())
            .get_result(&mut conn)
            .await?;
        Ok(user)
    }

    async fn find_user(&self, user_id: i32) -> AppResult<Option<User>> {
        let mut conn = get_connection(&self.pool).await?;
        let user = users::table
            .find(user_id)
            .select(User::as_select())
            .first(&mut conn)
            .await
            .optional()?;
        Ok(user)
    }

    async fn active_users(&self) -> AppResult<Vec<User>> {
        let mut conn = get_connection(&self.pool).await?;
        let rows = users::table
            .filter(users::is_active.eq(true))
            .order(users::id.asc())
            .select(User::as_select())
            .load(&mut conn)
            .await?;
        Ok(rows)
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn insert_task(&self, new: NewTask) -> AppResult<Task> {
        let mut conn = get_connection(&self.pool).await?;
        let task = diesel::insert_into(tasks::table)
            .values(&new)
            .returning(Task::as_returning())
            .get_result(&mut conn)
            .await?;
        Ok(task)
    }

    async fn find_task(&self, user_id: i32, task_id: i32) -> AppResult<Option<Task>> {
        let mut conn = get_connection(&self.pool).await?;
        let task = tasks::table
            .filter(tasks::id.eq(task_id))
            .filter(tasks::user_id.eq(user_id))
            .select(Task::as_select())
            .first(&mut conn)
            .await
            .optional()?;
        Ok(task)
    }

    async fn list_tasks(&self, user_id: i32, query: &TaskQuery) -> AppResult<Page<Task>> {
        let mut conn = get_connection(&self.pool).await?;
        let total: i64 = filtered_tasks(user_id, query)
            .count()
            .get_result(&mut conn)
            .await?;

        let page = query.page_request();
        let (offset, limit) = page_window(page, total);
        let items = filtered_tasks(user_id, query)
            .order((tasks::created_at.desc(), tasks::id.desc()))
            .limit(limit)
            .offset(offset)
            .select(Task::as_select())
            .load(&mut conn)
            .await?;

        Ok(page.into_page(items, total))
    }

    async fn save_task(&self, task: &Task) -> AppResult<Task> {
        let mut conn = get_connection(&self.pool).await?;
        let saved = diesel::update(tasks::table.find(task.id))
            .set(TaskChangeset::from(task))
            .returning(Task::as_returning())
            .get_result(&mut conn)
            .await?;
        Ok(saved)
    }

    async fn delete_task(&self, user_id: i32, task_id: i32) -> AppResult<bool> {
        let mut conn = get_connection(&self.pool).await?;
        let deleted = diesel::delete(
            tasks::table
                .filter(tasks::id.eq(task_id))
                .filter(tasks::user_id.eq(user_id)),
        )
        .execute(&mut conn)
        .await?;
        Ok(deleted > 0)
    }

    async fn task_stats(&self, user_id: i32, now: DateTime<Utc>) -> AppResult<TaskStats> {
        let mut conn = get_connection(&self.pool).await?;
        let rows: Vec<(String, String, Option<DateTime<Utc>>)> = tasks::table
            .filter(tasks::user_id.eq(user_id))
            .select((tasks::status, tasks::priority, tasks::due_date))
            .load(&mut conn)
            .await?;

        let typed = rows.into_iter().map(|(status, priority, due)| {
            (
                TaskStatus::parse(&status).unwrap_or_default(),
                TaskPriority::parse(&priority).unwrap_or_default(),
                due,
            )
        });
        Ok(TaskStats::tally(typed, now))
    }

    async fn open_tasks_due_between(
        &self,
        after: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> AppResult<Vec<Task>> {
        let mut conn = get_connection(&self.pool).await?;
        let rows = tasks::table
            .filter(tasks::status.eq_any(open_statuses()))
            .filter(tasks::due_date.gt(after))
            .filter(tasks::due_date.le(until))
            .order(tasks::due_date.asc())
            .select(Task::as_select())
            .load(&mut conn)
            .await?;
        Ok(rows)
    }

    async fn open_tasks_overdue(&self, now: DateTime<Utc>) -> AppResult<Vec<Task>> {
        let mut conn = get_connection(&self.pool).await?;
        let rows = tasks::table
            .filter(tasks::status.eq_any(open_statuses()))
            .filter(tasks::due_date.lt(now))
            .order(tasks::due_date.asc())
            .select(Task::as_select())
            .load(&mut conn)
            .await?;
        Ok(rows)
    }

    async fn delete_tasks_created_before(&self, cutoff: DateTime<Utc>) -> AppResult<usize> {
        let mut conn = get_connection(&self.pool).await?;
        let deleted = diesel::delete(tasks::table.filter(tasks::created_at.lt(cutoff)))
            .execute(&mut conn)
            .await?;
        Ok(deleted)
    }
}

#[async_trait]
impl CategoryStore for PgStore {
    async fn insert_category(&self, new: NewCategory) -> AppResult<Category> {
        let mut conn = get_connection(&self.pool).await?;
        let category = diesel::insert_into(categories::table)
            .values(&new)
            .returning(Category::as_returning())
            .get_result(&mut conn)
            .await?;
        Ok(category)
    }

    async fn visible_categories(&self, user_id: i32) -> AppResult<Vec<Category>> {
        let mut conn = get_connection(&self.pool).await?;
        let rows = categories::table
            .filter(
                categories::user_id
                    .eq(user_id)
                    .or(categories::user_id.is_null()),
            )
            .order((categories::name.asc(), categories::id.asc()))
            .select(Category::as_select())
            .load(&mut conn)
            .await?;
        Ok(rows)
    }

    async fn find_visible_category(
        &self,
        user_id: i32,
        category_id: i32,
    ) -> AppResult<Option<Category>> {
        let mut conn = get_connection(&self.pool).await?;
        let category = categories::table
            .filter(categories::id.eq(category_id))
            .filter(
                categories::user_id
                    .eq(user_id)
                    .or(categories::user_id.is_null()),
            )
            .select(Category::as_select())
            .first(&mut conn)
            .await
            .optional()?;
        Ok(category)
    }

    async fn save_category(&self, category: &Category) -> AppResult<Category> {
        let mut conn = get_connection(&self.pool).await?;
        let saved = diesel::update(categories::table.find(category.id))
            .set(CategoryChangeset {
                name: &category.name,
                color: &category.color,
            })
            .returning(Category::as_returning())
            .get_result(&mut conn)
            .await?;
        Ok(saved)
    }

    async fn delete_category(&self, user_id: i32, category_id: i32) -> AppResult<bool> {
        let mut conn = get_connection(&self.pool).await?;
        let deleted = diesel::delete(
            categories::table
                .filter(categories::id.eq(category_id))
                .filter(categories::user_id.eq(user_id)),
        )
        .execute(&mut conn)
        .await?;
        Ok(deleted > 0)
    }

    async fn category_in_use(&self, category_id: i32) -> AppResult<bool> {
        let mut conn = get_connection(&self.pool).await?;
        let in_use = diesel::select(exists(
            tasks::table.filter(tasks::category_id.eq(category_id)),
        ))
        .get_result::<bool>(&mut conn)
        .await?;
        Ok(in_use)
    }
}

#[async_trait]
impl Store for PgStore {
    async fn health_check(&self) -> AppResult<()> {
        let mut conn = get_connection(&self.pool).await?;
        diesel::sql_query("SELECT 1").execute(&mut conn).await?;
        Ok(())
    }
}
