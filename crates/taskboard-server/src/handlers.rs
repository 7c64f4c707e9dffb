//! HTTP handlers for tasks, categories and dashboard stats.
//!
//! Reads never fail towards the client: a storage error is logged and the
//! handler answers with an empty list or zero counts. Writes report storage
//! errors as 500.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::Value;
use tracing::warn;

use taskboard_core::{Category, CategoryFields, DashboardStats, Task, TaskFields, TaskId};
use taskboard_store::{CategoryRepo, Database, StoreError, TaskRepo};

use crate::api::{decode_body, ApiError, CreatedBody, MessageBody};

/// Repositories shared by all handlers. Built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub tasks: Arc<TaskRepo>,
    pub categories: Arc<CategoryRepo>,
}

impl AppState {
    pub fn new(db: Database) -> Self {
        Self {
            tasks: Arc::new(TaskRepo::new(db.clone())),
            categories: Arc::new(CategoryRepo::new(db)),
        }
    }
}

/// Run a blocking repository call off the async worker threads.
async fn blocking<T, F>(f: F) -> Result<T, StoreError>
where
    F: FnOnce() -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| StoreError::Unavailable(format!("storage task failed: {e}")))?
}

fn json_body(body: Result<Json<Value>, JsonRejection>) -> Result<Value, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|e| ApiError::BadRequest(e.body_text()))
}

fn task_id(path: Result<Path<TaskId>, PathRejection>) -> Result<TaskId, ApiError> {
    path.map(|Path(id)| id)
        .map_err(|e| ApiError::BadRequest(e.body_text()))
}

// ── Tasks ──

/// GET /tasks
pub async fn list_tasks(State(state): State<AppState>) -> Json<Vec<Task>> {
    let repo = Arc::clone(&state.tasks);
    match blocking(move || repo.list_all()).await {
        Ok(tasks) => Json(tasks),
        Err(e) => {
            warn!(error = %e, kind = e.error_kind(), "listing tasks failed, answering empty list");
            Json(Vec::new())
        }
    }
}

/// POST /tasks
pub async fn create_task(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedBody>), ApiError> {
    let fields: TaskFields = decode_body(json_body(body)?)?;
    let draft = fields.into_draft()?;

    let repo = Arc::clone(&state.tasks);
    let id = blocking(move || repo.create(&draft))
        .await
        .map_err(ApiError::storage("Failed to create task"))?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedBody {
            id: id.get(),
            message: "Task created successfully".to_string(),
        }),
    ))
}

/// PUT /tasks/{id}
pub async fn update_task(
    State(state): State<AppState>,
    path: Result<Path<TaskId>, PathRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<MessageBody>, ApiError> {
    let id = task_id(path)?;
    let fields: TaskFields = decode_body(json_body(body)?)?;
    let draft = fields.into_draft()?;

    let repo = Arc::clone(&state.tasks);
    blocking(move || repo.update(id, &draft))
        .await
        .map_err(ApiError::storage("Failed to update task"))?;

    Ok(Json(MessageBody::new("Task updated successfully")))
}

/// DELETE /tasks/{id}
pub async fn delete_task(
    State(state): State<AppState>,
    path: Result<Path<TaskId>, PathRejection>,
) -> Result<Json<MessageBody>, ApiError> {
    let id = task_id(path)?;

    let repo = Arc::clone(&state.tasks);
    blocking(move || repo.delete(id))
        .await
        .map_err(ApiError::storage("Failed to delete task"))?;

    Ok(Json(MessageBody::new("Task deleted successfully")))
}

/// PUT /tasks/reorder
pub async fn reorder_tasks(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<MessageBody>, ApiError> {
    let orders = parse_reorder(json_body(body)?)?;

    let repo = Arc::clone(&state.tasks);
    blocking(move || repo.reorder(&orders))
        .await
        .map_err(ApiError::storage("Failed to reorder tasks"))?;

    Ok(Json(MessageBody::new("Tasks reordered successfully")))
}

/// Parse `{"<task id>": <order_index>, ...}`.
pub fn parse_reorder(body: Value) -> Result<BTreeMap<TaskId, i64>, ApiError> {
    let Value::Object(map) = body else {
        return Err(ApiError::BadRequest(
            "Reorder body must be an object of task id to order index".to_string(),
        ));
    };

    map.into_iter()
        .map(|(key, value)| {
            let id: TaskId = key
                .parse()
                .map_err(|_| ApiError::BadRequest(format!("Invalid task id: {key}")))?;
            let order_index = value.as_i64().ok_or_else(|| {
                ApiError::BadRequest(format!("Invalid order index for task {key}: {value}"))
            })?;
            Ok((id, order_index))
        })
        .collect()
}

/// GET /dashboard/stats
pub async fn dashboard_stats(State(state): State<AppState>) -> Json<DashboardStats> {
    let repo = Arc::clone(&state.tasks);
    match blocking(move || repo.dashboard_stats()).await {
        Ok(stats) => Json(stats),
        Err(e) => {
            warn!(error = %e, kind = e.error_kind(), "dashboard stats failed, answering zeros");
            Json(DashboardStats::default())
        }
    }
}

// ── Categories ──

/// GET /categories
pub async fn list_categories(State(state): State<AppState>) -> Json<Vec<Category>> {
    let repo = Arc::clone(&state.categories);
    match blocking(move || repo.list_all()).await {
        Ok(categories) => Json(categories),
        Err(e) => {
            warn!(error = %e, kind = e.error_kind(), "listing categories failed, answering empty list");
            Json(Vec::new())
        }
    }
}

/// POST /categories
pub async fn create_category(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedBody>), ApiError> {
    let fields: CategoryFields = decode_body(json_body(body)?)?;
    let name = fields.into_name()?;

    let repo = Arc::clone(&state.categories);
    let id = blocking(move || repo.create(&name))
        .await
        .map_err(ApiError::storage("Failed to create category"))?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedBody {
            id: id.get(),
            message: "Category created successfully".to_string(),
        }),
    ))
}

// ── System ──

/// GET /health
pub async fn health() -> Json<Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
