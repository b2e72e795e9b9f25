/// TaskHub Web - Task model.
///
/// Status and priority are stored as strings and exposed through typed
/// accessors. `completed_at` is set exactly while the status is `completed`.
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use super::page::PageRequest;
use crate::schema::tasks;

/// Task lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl TaskStatus {
    /// Statuses the sweep jobs consider actionable.
    pub const OPEN: [TaskStatus; 2] = [Self::Pending, Self::InProgress];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn is_open(&self) -> bool {
        Self::OPEN.contains(self)
    }
}

/// Task priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "urgent" => Some(Self::Urgent),
            _ => None,
        }
    }
}

/// Task database model.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Task {
    pub id: i32,
    pub user_id: i32,
    pub title: String,
    pub description: String,
    pub status: String,
    pub priority: String,
    pub category_id: Option<i32>,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// What an edit changed, as far as notifications care.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskChange {
    /// The edit moved the task into `completed`.
    pub completed: bool,
}

impl Task {
    pub fn status(&self) -> TaskStatus {
        TaskStatus::parse(&self.status).unwrap_or_default()
    }

    pub fn priority(&self) -> TaskPriority {
        TaskPriority::parse(&self.priority).unwrap_or_default()
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        matches!(self.due_date, Some(due) if self.status().is_open() && now > due)
    }

    /// Whole days until the due date, floored at zero. `None` without a due
    /// date or once completed.
    pub fn days_remaining(&self, now: DateTime<Utc>) -> Option<i64> {
        let due = self.due_date?;
        if self.status() == TaskStatus::Completed {
            return None;
        }
        Some((due - now).num_days().max(0))
    }

    /// Relative link used in notifications.
    pub fn url(&self) -> String {
        format!("/tasks/{}/", self.id)
    }

    /// Replace the editable fields with `input`.
    pub fn apply(&mut self, input: TaskInput, now: DateTime<Utc>) -> TaskChange {
        let was_completed = self.status() == TaskStatus::Completed;
        self.title = input.title.trim().to_string();
        self.description = input.description;
        self.priority = input.priority.as_str().to_string();
        self.category_id = input.category_id;
        self.due_date = input.due_date;
        self.set_status(input.status, now);
        self.updated_at = now;
        TaskChange {
            completed: !was_completed && input.status == TaskStatus::Completed,
        }
    }

    /// Mark completed. Returns `false` when it already was.
    pub fn complete(&mut self, now: DateTime<Utc>) -> bool {
        if self.status() == TaskStatus::Completed {
            return false;
        }
        self.set_status(TaskStatus::Completed, now);
        self.updated_at = now;
        true
    }

    fn set_status(&mut self, status: TaskStatus, now: DateTime<Utc>) {
        self.status = status.as_str().to_string();
        if status == TaskStatus::Completed {
            self.completed_at.get_or_insert(now);
        } else {
            self.completed_at = None;
        }
    }

    pub fn to_dto(&self, now: DateTime<Utc>) -> TaskDto {
        TaskDto {
            id: self.id,
            title: self.title.clone(),
            description: self.description.clone(),
            status: self.status(),
            priority: self.priority(),
            category_id: self.category_id,
            due_date: self.due_date,
            created_at: self.created_at,
            updated_at: self.updated_at,
            completed_at: self.completed_at,
            is_overdue: self.is_overdue(now),
            days_remaining: self.days_remaining(now),
        }
    }
}

/// New task for insertion.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = tasks)]
pub struct NewTask {
    pub user_id: i32,
    pub title: String,
    pub description: String,
    pub status: String,
    pub priority: String,
    pub category_id: Option<i32>,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl NewTask {
    pub fn from_input(user_id: i32, input: TaskInput, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            title: input.title.trim().to_string(),
            description: input.description,
            status: input.status.as_str().to_string(),
            priority: input.priority.as_str().to_string(),
            category_id: input.category_id,
            due_date: input.due_date,
            created_at: now,
            updated_at: now,
            completed_at: (input.status == TaskStatus::Completed).then_some(now),
        }
    }
}

fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// Create/replace payload for a task.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TaskInput {
    #[validate(length(min = 1, max = 200), custom(function = "validate_not_blank"))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default)]
    pub category_id: Option<i32>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
}

impl TaskInput {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            status: TaskStatus::default(),
            priority: TaskPriority::default(),
            category_id: None,
            due_date: None,
        }
    }
}

/// List filters, as read from the query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskQuery {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub category: Option<i32>,
    pub search: Option<String>,
    /// Kept raw; anything that is not a number falls back in `page_request`.
    pub page: Option<String>,
    pub per_page: Option<String>,
}

impl TaskQuery {
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
    }

    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(
            parse_number(self.page.as_deref()),
            parse_number(self.per_page.as_deref()),
        )
    }

    /// In-process equivalent of the SQL filter.
    pub fn matches(&self, task: &Task) -> bool {
        if self.status.is_some_and(|s| s != task.status()) {
            return false;
        }
        if self.priority.is_some_and(|p| p != task.priority()) {
            return false;
        }
        if self.category.is_some() && self.category != task.category_id {
            return false;
        }
        match self.search_term() {
            Some(term) => {
                let term = term.to_lowercase();
                task.title.to_lowercase().contains(&term)
                    || task.description.to_lowercase().contains(&term)
            }
            None => true,
        }
    }
}

/// Per-user counters for the dashboard and the daily digest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStats {
    pub total: i64,
    pub completed: i64,
    pub pending: i64,
    pub in_progress: i64,
    pub overdue: i64,
    pub high_priority: i64,
    pub medium_priority: i64,
    pub low_priority: i64,
}

impl TaskStats {
    pub fn tally<I>(rows: I, now: DateTime<Utc>) -> Self
    where
        I: IntoIterator<Item = (TaskStatus, TaskPriority, Option<DateTime<Utc>>)>,
    {
        let mut stats = Self::default();
        for (status, priority, due_date) in rows {
            stats.total += 1;
            match status {
                TaskStatus::Completed => stats.completed += 1,
                TaskStatus::Pending => stats.pending += 1,
                TaskStatus::InProgress => stats.in_progress += 1,
                TaskStatus::Cancelled => {}
            }
            if status.is_open() && due_date.is_some_and(|due| due < now) {
                stats.overdue += 1;
            }
            match priority {
                TaskPriority::High => stats.high_priority += 1,
                TaskPriority::Medium => stats.medium_priority += 1,
                TaskPriority::Low => stats.low_priority += 1,
                TaskPriority::Urgent => {}
            }
        }
        stats
    }
}

/// Task as returned by the HTTP API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDto {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub category_id: Option<i32>,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub is_overdue: bool,
    pub days_remaining: Option<i64>,
}

fn parse_number(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|value| value.trim().parse().ok())
}
