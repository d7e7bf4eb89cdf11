use axum::{
    extract::rejection::{BytesRejection, JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use std::fmt;

/// Application-specific error types.
#[derive(Debug)]
pub enum AppError {
    /// Missing or malformed required input, optionally echoing what was received.
    Validation {
        message: String,
        received: Option<Value>,
    },
    /// Bad request error (unreadable body, nothing to update).
    BadRequest(String),
    /// Body rejected by an extractor (too large, wrong content type, bad JSON).
    Rejected { status: StatusCode, message: String },
    /// Resource not found error.
    NotFound(String),
    /// Missing or wrong internal key.
    Unauthorized(String),
    /// Database-related errors.
    DatabaseError(sqlx::Error),
    /// Internal server error.
    InternalError(String),
    /// Error with context chain for better debugging.
    WithContext {
        /// The underlying source of the error.
        source: Box<AppError>,
        /// Additional context message.
        context: String,
    },
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation {
            message: message.into(),
            received: None,
        }
    }

    /// Attaches the received payload to a validation error.
    pub fn with_received(self, payload: Value) -> Self {
        match self {
            AppError::Validation { message, .. } => AppError::Validation {
                message,
                received: Some(payload),
            },
            other => other,
        }
    }

    /// HTTP status this error maps to.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Rejected { status, .. } => *status,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::DatabaseError(_) | AppError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::WithContext { source, .. } => source.status(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation { message, .. } => write!(f, "Validation error: {}", message),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::Rejected { status, message } => {
                write!(f, "Request rejected ({}): {}", status, message)
            }
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::DatabaseError(e) => write!(f, "Database error: {}", e),
            AppError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            AppError::WithContext { source, context } => {
                write!(f, "{}: {}", context, source)
            }
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    /// Maps each error variant to an HTTP status code and JSON body.
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            AppError::Validation { message, received } => {
                tracing::warn!("Validation failed: {}", message);
                match received {
                    Some(received) => json!({ "error": message, "received": received }),
                    None => json!({ "error": message }),
                }
            }
            AppError::BadRequest(msg) => {
                tracing::warn!("Bad request: {}", msg);
                json!({ "error": msg })
            }
            AppError::Rejected { message, .. } => {
                tracing::warn!("Request rejected: {}", message);
                json!({ "error": message })
            }
            AppError::NotFound(msg) => json!({ "error": msg }),
            AppError::Unauthorized(msg) => {
                tracing::warn!("Unauthorized access: {}", msg);
                json!({ "error": "Unauthorized" })
            }
            AppError::DatabaseError(e) => {
                tracing::error!("Database error: {:?}", e);
                json!({ "error": e.to_string() })
            }
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                json!({ "error": msg })
            }
            AppError::WithContext { source, context } => {
                // Log full context chain, respond as the underlying error
                tracing::error!("Error with context: {} -> {}", context, source);
                return source.into_response();
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::DatabaseError(err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InternalError(format!("JSON serialization failed: {}", err))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<BytesRejection> for AppError {
    fn from(rejection: BytesRejection) -> Self {
        AppError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

/// Extension trait for adding context to errors.
/// Similar to `anyhow::Context` but for our `AppError` type.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T, AppError>;
}

impl<T> ResultExt<T> for Result<T, AppError> {
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: context.into(),
        })
    }
}

impl<T> ResultExt<T> for Result<T, sqlx::Error> {
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(AppError::DatabaseError(e)),
            context: context.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_validation_echoes_received_payload() {
        let err = AppError::validation("metadata.service_type is required")
            .with_received(json!({ "budget": 10 }));
        let response = err.into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "metadata.service_type is required");
        assert_eq!(body["received"]["budget"], 10);
    }

    #[tokio::test]
    async fn test_unauthorized_is_generic() {
        let response = AppError::Unauthorized("bad key".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await, json!({ "error": "Unauthorized" }));
    }

    #[tokio::test]
    async fn test_context_keeps_underlying_status() {
        let result: Result<(), AppError> = Err(AppError::NotFound("Ad 7 not found".into()));
        let err = result.context("fetching ad").unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "fetching ad: Not found: Ad 7 not found");
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_database_error_surfaces_message() {
        let response = AppError::from(sqlx::Error::RowNotFound).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("no rows"));
    }
}
