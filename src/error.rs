use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::repositories::RepositoryError;
use crate::services::CheckError;

// Type alias for Result with our AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Request-level failure, tagged with the category the transport layer maps
/// to a status code.
///
/// | Variant        | `type` code              | Status |
/// |----------------|--------------------------|--------|
/// | Parse          | `parse_error`            | 400    |
/// | Validation     | `validation_error`       | 400    |
/// | NotFound       | `not_found`              | 404    |
/// | Network        | `network_error`          | 500    |
/// | Persistence    | `database_error`         | 500    |
/// | FileAttachment | `file_header_open_error` | 500    |
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Database error: {0}")]
    Persistence(String),

    #[error("File attachment error: {0}")]
    FileAttachment(String),
}

impl AppError {
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Parse(_) => "parse_error",
            AppError::Validation(_) => "validation_error",
            AppError::NotFound(_) => "not_found",
            AppError::Network(_) => "network_error",
            AppError::Persistence(_) => "database_error",
            AppError::FileAttachment(_) => "file_header_open_error",
        }
    }

    pub fn info(&self) -> &str {
        match self {
            AppError::Parse(msg)
            | AppError::Validation(msg)
            | AppError::NotFound(msg)
            | AppError::Network(msg)
            | AppError::Persistence(msg)
            | AppError::FileAttachment(msg) => msg,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Parse(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Network(_) | AppError::Persistence(_) | AppError::FileAttachment(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn is_server_fault(&self) -> bool {
        self.status().is_server_error()
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(id) => {
                AppError::NotFound(format!("handler {} is not registered", id))
            }
            other => AppError::Persistence(other.to_string()),
        }
    }
}

impl From<CheckError> for AppError {
    fn from(err: CheckError) -> Self {
        match err {
            CheckError::MethodNotFound(_) => AppError::Validation(err.to_string()),
            CheckError::Network(msg) => AppError::Network(msg),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_server_fault() {
            tracing::error!(kind = self.kind(), info = self.info(), "request failed");
        } else {
            tracing::debug!(kind = self.kind(), info = self.info(), "request rejected");
        }

        let body = json!({
            "errors": [{
                "type": self.kind(),
                "info": self.info(),
            }]
        });

        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Method;

    #[test]
    fn test_client_errors_map_to_4xx() {
        assert_eq!(
            AppError::Parse("x".into()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Validation("x".into()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::NotFound("x".into()).into_response().status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_server_errors_map_to_500() {
        for err in [
            AppError::Network("x".into()),
            AppError::Persistence("x".into()),
            AppError::FileAttachment("x".into()),
        ] {
            assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
        }
    }

    #[test]
    fn test_repository_not_found_becomes_not_found() {
        let err: AppError = RepositoryError::NotFound("abc".into()).into();
        assert!(matches!(err, AppError::NotFound(ref m) if m.contains("abc")));

        let err: AppError = RepositoryError::Timeout(1000).into();
        assert!(matches!(err, AppError::Persistence(_)));
    }

    #[test]
    fn test_check_errors_keep_their_category() {
        let err: AppError = CheckError::MethodNotFound(Method::new("/x", "GET")).into();
        assert_eq!(err.kind(), "validation_error");
        assert!(err.info().contains("GET /x"));

        let err: AppError = CheckError::Network("connection refused".into()).into();
        assert_eq!(err.kind(), "network_error");
    }
}
