use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::Value;
use taskboard_core::ValidationError;
use taskboard_store::StoreError;

/// `{"message": ...}` body for successful writes.
#[derive(Debug, Serialize)]
pub struct MessageBody {
    pub message: String,
}

impl MessageBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// `{"id": ..., "message": ...}` body for creates.
#[derive(Debug, Serialize)]
pub struct CreatedBody {
    pub id: i64,
    pub message: String,
}

/// `{"error": ...}` body for every failure.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Failures a handler reports to the client.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Body or path could not be parsed into the expected shape.
    #[error("{0}")]
    BadRequest(String),

    /// A write failed in storage. `message` is what the client sees.
    #[error("{message}: {source}")]
    Storage {
        message: &'static str,
        source: StoreError,
    },
}

impl ApiError {
    pub fn storage(message: &'static str) -> impl FnOnce(StoreError) -> Self {
        move |source| Self::Storage { message, source }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Storage { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = match self {
            Self::Validation(e) => e.client_message(),
            Self::BadRequest(msg) => msg,
            Self::Storage { message, source } => {
                tracing::warn!(error = %source, kind = source.error_kind(), "{message}");
                message.to_string()
            }
        };
        (status, Json(ErrorBody { error })).into_response()
    }
}

/// Decode a JSON request body into `T`. A `null` body decodes as `T::default()`.
pub fn decode_body<T>(body: Value) -> Result<T, ApiError>
where
    T: serde::de::DeserializeOwned + Default,
{
    if body.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(body).map_err(|e| ApiError::BadRequest(format!("Invalid request body: {e}")))
}
