//! API error handling
//!
//! Every failure is rendered as `{ "_type": "Error", "errorIdentifier", "message" }`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use blog_core::error::ValidationErrors;
use blog_db::RepositoryError;
use serde::Serialize;

/// API error types
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    Validation(ValidationErrors),
    BadRequest(String),
    Conflict(String),
    Unavailable(String),
    Internal(String),
}

impl ApiError {
    pub fn not_found(resource: &'static str, id: impl std::fmt::Display) -> Self {
        ApiError::NotFound(format!("{} with id {} not found", resource, id))
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        ApiError::BadRequest(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        ApiError::Conflict(msg.into())
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        ApiError::Unavailable(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        ApiError::Internal(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_identifier(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "NotFound",
            ApiError::Validation(_) => "PropertyConstraintViolation",
            ApiError::BadRequest(_) => "InvalidRequest",
            ApiError::Conflict(_) => "Conflict",
            ApiError::Unavailable(_) => "ServiceUnavailable",
            ApiError::Internal(_) => "InternalError",
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Validation(errors) => errors.full_messages().join(", "),
            ApiError::NotFound(msg)
            | ApiError::BadRequest(msg)
            | ApiError::Conflict(msg)
            | ApiError::Unavailable(msg) => msg.clone(),
            // details stay in the log
            ApiError::Internal(_) => "An internal error occurred".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    #[serde(rename = "_type")]
    pub type_name: &'static str,
    #[serde(rename = "errorIdentifier")]
    pub error_identifier: &'static str,
    pub message: String,
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(msg) => ApiError::NotFound(msg),
            RepositoryError::Validation(errors) => ApiError::Validation(errors),
            err @ RepositoryError::Integrity { .. } => ApiError::Conflict(err.to_string()),
            RepositoryError::Unavailable(msg) => {
                tracing::warn!(error = %msg, "database unavailable");
                ApiError::Unavailable("The database is currently unavailable".to_string())
            }
            err @ (RepositoryError::Inconsistent(_) | RepositoryError::Database(_)) => {
                ApiError::Internal(err.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if let ApiError::Internal(detail) = &self {
            tracing::error!(error = %detail, "request failed");
        }

        let body = ErrorBody {
            type_name: "Error",
            error_identifier: self.error_identifier(),
            message: self.message(),
        };

        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use blog_db::IntegrityViolation;

    #[test]
    fn test_repository_error_mapping() {
        let conflict = ApiError::from(RepositoryError::Integrity {
            violation: IntegrityViolation::ForeignKey,
            constraint: Some("posts_user_id_fkey".into()),
            message: "insert or update violates foreign key".into(),
        });
        assert_eq!(conflict.status_code(), StatusCode::CONFLICT);
        assert_eq!(conflict.error_identifier(), "Conflict");

        let unavailable = ApiError::from(RepositoryError::Unavailable("pool timed out".into()));
        assert_eq!(unavailable.status_code(), StatusCode::SERVICE_UNAVAILABLE);

        let internal = ApiError::from(RepositoryError::Inconsistent("orphan".into()));
        assert_eq!(internal.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(internal.message(), "An internal error occurred");
    }

    #[test]
    fn test_validation_error_message() {
        let mut errors = ValidationErrors::new();
        errors.add("title", "must be between 1 and 200 characters");
        let err = ApiError::from(RepositoryError::Validation(errors));

        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.error_identifier(), "PropertyConstraintViolation");
        assert!(err.message().contains("must be between 1 and 200 characters"));
    }

    #[test]
    fn test_not_found_message() {
        let err = ApiError::not_found("Post", 42);
        assert_eq!(err.message(), "Post with id 42 not found");
        assert_eq!(
            ApiError::from(RepositoryError::NotFound("User with id 7 not found".into())).message(),
            "User with id 7 not found"
        );
    }
}
