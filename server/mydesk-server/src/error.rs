use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use error_common::{report_error, DeskError, ErrorContext};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;
use uuid::Uuid;

/// Standard API error response structure
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Unique error ID for tracking
    pub error_id: String,
    /// Error type/code
    pub error_type: String,
    /// Human-readable error message
    pub message: String,
    /// Stable error code from `error_common::codes`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Timestamp when error occurred
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Successful API response; serialises as the bare entity body
#[derive(Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiResponse<T> {
    pub data: T,
}

/// Main API error enum
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{message}")]
    Validation { message: String },

    #[error("{message}")]
    Authentication { message: String },

    #[error("{message}")]
    Authorization { message: String },

    #[error("{resource_type} not found")]
    NotFound { resource_type: String },

    #[error("{message}")]
    Conflict { message: String },

    #[error("{message}")]
    Internal { message: String },

    #[error("{message}")]
    BadRequest { message: String },
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    pub fn authorization(message: impl Into<String>) -> Self {
        Self::Authorization {
            message: message.into(),
        }
    }

    pub fn not_found(resource_type: impl Into<String>) -> Self {
        Self::NotFound {
            resource_type: resource_type.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } | ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Authentication { .. } => StatusCode::UNAUTHORIZED,
            ApiError::Authorization { .. } => StatusCode::FORBIDDEN,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error type string
    pub fn error_type(&self) -> &'static str {
        match self {
            ApiError::Validation { .. } => "validation_error",
            ApiError::Authentication { .. } => "authentication_error",
            ApiError::Authorization { .. } => "authorization_error",
            ApiError::NotFound { .. } => "not_found",
            ApiError::Conflict { .. } => "conflict",
            ApiError::Internal { .. } => "internal_error",
            ApiError::BadRequest { .. } => "bad_request",
        }
    }

    fn code(&self) -> Option<&'static str> {
        use error_common::codes;
        match self {
            ApiError::Validation { .. } => Some(codes::validation::INVALID_INPUT),
            ApiError::Authentication { .. } => Some(codes::authentication::INVALID_CREDENTIALS),
            ApiError::Authorization { .. } => Some(codes::authorization::INSUFFICIENT_ROLE),
            ApiError::NotFound { .. } => Some(codes::storage::NOT_FOUND),
            ApiError::Conflict { .. } => Some(codes::storage::DUPLICATE_ENTRY),
            ApiError::Internal { .. } | ApiError::BadRequest { .. } => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error_id = Uuid::new_v4().to_string();
        let status_code = self.status_code();

        // Log the error with correlation ID
        error!(
            error_id = %error_id,
            error_type = %self.error_type(),
            status_code = %status_code.as_u16(),
            error = %self,
            "API error occurred"
        );

        let error_response = ApiErrorResponse {
            error_id,
            error_type: self.error_type().to_string(),
            message: self.to_string(),
            code: self.code().map(str::to_string),
            timestamp: chrono::Utc::now(),
        };

        (status_code, Json(error_response)).into_response()
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Helper function to create successful API responses
pub fn api_success<T>(data: T) -> ApiResponse<T> {
    ApiResponse { data }
}

impl From<DeskError> for ApiError {
    fn from(error: DeskError) -> Self {
        match error {
            DeskError::ValidationError(message) => ApiError::Validation { message },
            DeskError::ConflictError(message) => ApiError::Conflict { message },
            DeskError::NotFoundError(resource_type) => ApiError::NotFound { resource_type },
            DeskError::AuthError(message) => ApiError::Authentication { message },
            other => {
                report_error(&other, &ErrorContext::new());
                ApiError::Internal {
                    message: "Internal server error".to_string(),
                }
            }
        }
    }
}

/// Convert anyhow errors to API errors
impl From<anyhow::Error> for ApiError {
    fn from(error: anyhow::Error) -> Self {
        ApiError::Internal {
            message: error.to_string(),
        }
    }
}

/// Convert serde JSON errors to API errors
impl From<serde_json::Error> for ApiError {
    fn from(error: serde_json::Error) -> Self {
        ApiError::BadRequest {
            message: format!("Invalid JSON: {error}"),
        }
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<ApiResponse<T>, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::conflict("dup").status_code(), StatusCode::CONFLICT);
        assert_eq!(ApiError::validation("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::authorization("x").status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::not_found("Task").to_string(), "Task not found");
    }

    #[test]
    fn test_desk_error_mapping_hides_internal_details() {
        let err: ApiError = DeskError::StorageError("/srv/profile/tasks.json: EACCES".into()).into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.to_string().contains("tasks.json"));

        let err: ApiError = DeskError::ConflictError("Duplicate file number".into()).into();
        assert_eq!(err.to_string(), "Duplicate file number");
    }

    #[test]
    fn test_success_body_is_the_entity() {
        let body = serde_json::to_value(api_success(serde_json::json!({ "id": "t1" }))).unwrap();
        assert_eq!(body, serde_json::json!({ "id": "t1" }));
        let body = serde_json::to_value(api_success(vec!["HR"])).unwrap();
        assert_eq!(body, serde_json::json!(["HR"]));
    }
}
