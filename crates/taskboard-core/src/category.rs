use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;
use crate::ids::CategoryId;
use crate::task::text_or_absent;

/// Categories seeded when storage is initialized.
pub const DEFAULT_CATEGORIES: [&str; 4] = ["Work", "Personal", "Shopping", "Health"];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

/// Body of a category create request.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct CategoryFields {
    #[serde(deserialize_with = "text_or_absent")]
    pub name: Option<String>,
}

impl CategoryFields {
    pub fn into_name(self) -> Result<String, ValidationError> {
        self.name
            .filter(|n| !n.is_empty())
            .ok_or(ValidationError::MissingField("name"))
    }
}
