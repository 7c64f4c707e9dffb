//! Domain types shared by the taskboard store and HTTP layer.

pub mod category;
pub mod errors;
pub mod ids;
pub mod task;

pub use category::{Category, CategoryFields, DEFAULT_CATEGORIES};
pub use errors::ValidationError;
pub use ids::{CategoryId, TaskId};
pub use task::{DashboardStats, Task, TaskDraft, TaskFields};
