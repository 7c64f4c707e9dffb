use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::ValidationError;
use crate::ids::TaskId;

pub const DEFAULT_PRIORITY: &str = "Medium";
pub const STATUS_PENDING: &str = "pending";
pub const STATUS_COMPLETED: &str = "completed";

/// A persisted task as returned by listing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub priority: String,
    pub category: Option<String>,
    /// `YYYY-MM-DD`, stored and returned as text.
    pub due_date: Option<String>,
    pub status: String,
    pub order_index: i64,
    /// SQLite `CURRENT_TIMESTAMP` text, UTC.
    pub created_at: String,
}

/// Task fields as they arrive in a create or update request body.
///
/// Every field is optional at this stage; [`TaskFields::into_draft`] enforces
/// the required title and applies defaults.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct TaskFields {
    #[serde(deserialize_with = "text_or_absent")]
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub category: Option<String>,
    pub due_date: Option<String>,
    pub status: Option<String>,
}

/// Read a required text field, treating any non-string value as absent so
/// validation reports it the same way as a missing field.
pub(crate) fn text_or_absent<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Text {
        Text(String),
        Other(serde::de::IgnoredAny),
    }

    Ok(match Text::deserialize(deserializer)? {
        Text::Text(text) => Some(text),
        Text::Other(_) => None,
    })
}

/// Validated, normalized task fields ready to be written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub priority: String,
    pub category: Option<String>,
    pub due_date: Option<String>,
    pub status: String,
}

impl TaskFields {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    /// Require a non-empty title, fill defaults and turn empty `category` /
    /// `due_date` into null.
    pub fn into_draft(self) -> Result<TaskDraft, ValidationError> {
        let title = self
            .title
            .filter(|t| !t.is_empty())
            .ok_or(ValidationError::MissingField("title"))?;

        Ok(TaskDraft {
            title,
            description: self.description.unwrap_or_default(),
            priority: self.priority.unwrap_or_else(|| DEFAULT_PRIORITY.to_string()),
            category: empty_to_null(self.category),
            due_date: empty_to_null(self.due_date),
            status: self.status.unwrap_or_else(|| STATUS_PENDING.to_string()),
        })
    }
}

impl TaskDraft {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            priority: DEFAULT_PRIORITY.to_string(),
            category: None,
            due_date: None,
            status: STATUS_PENDING.to_string(),
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    pub fn with_due_date(mut self, due_date: impl Into<String>) -> Self {
        self.due_date = empty_to_null(Some(due_date.into()));
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = empty_to_null(Some(category.into()));
        self
    }
}

fn empty_to_null(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Task counts shown on the dashboard.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub due_today: i64,
    pub overdue: i64,
    pub completed: i64,
    pub pending: i64,
}
