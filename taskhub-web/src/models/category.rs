/// TaskHub Web - Category model.
///
/// A category without an owner is global and visible to everyone; only the
/// owner may edit or delete a category.
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::schema::categories;

pub const DEFAULT_COLOR: &str = "#007bff";

/// Category database model.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = categories)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Category {
    pub id: i32,
    pub name: String,
    pub color: String,
    pub user_id: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl Category {
    pub fn is_global(&self) -> bool {
        self.user_id.is_none()
    }

    pub fn is_visible_to(&self, user_id: i32) -> bool {
        self.user_id.is_none_or(|owner| owner == user_id)
    }

    pub fn is_owned_by(&self, user_id: i32) -> bool {
        self.user_id == Some(user_id)
    }
}

/// New category for insertion.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = categories)]
pub struct NewCategory {
    pub name: String,
    pub color: String,
    pub user_id: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl NewCategory {
    pub fn from_input(user_id: Option<i32>, input: CategoryInput) -> AppResult<Self> {
        Ok(Self {
            color: normalize_color(input.color.as_deref())?,
            name: input.name.trim().to_string(),
            user_id,
            created_at: Utc::now(),
        })
    }
}

/// Create/replace payload for a category.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CategoryInput {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

/// Normalize a hex color to `#rrggbb`. Missing or empty input yields the
/// default color; a missing leading `#` is added.
pub fn normalize_color(color: Option<&str>) -> AppResult<String> {
    let color = match color.map(str::trim) {
        None | Some("") => return Ok(DEFAULT_COLOR.to_string()),
        Some(c) => c,
    };
    let hex = color.strip_prefix('#').unwrap_or(color);
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(AppError::Validation(format!("Invalid color: {}", color)));
    }
    Ok(format!("#{}", hex))
}
