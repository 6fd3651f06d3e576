//! Error types for the HTTP API.
//!
//! Every failure leaves the server as `{ "code": "SCREAMING_SNAKE", "message": "..." }`
//! with a status derived from the code.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use tally_core::{CoreError, ValidationError};
use tally_db::DbError;

use crate::auth::AuthError;

/// Machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    Unauthorized,
    NotFound,
    ProductsNotFound,
    DiscountNotFound,
    ValidationFailed,
    EmptyOrder,
    InsufficientStock,
    InvalidDateRange,
    Conflict,
    ServiceUnavailable,
    Internal,
}

impl ErrorCode {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::NotFound | ErrorCode::ProductsNotFound | ErrorCode::DiscountNotFound => {
                StatusCode::NOT_FOUND
            }
            ErrorCode::ValidationFailed
            | ErrorCode::EmptyOrder
            | ErrorCode::InsufficientStock
            | ErrorCode::InvalidDateRange => StatusCode::BAD_REQUEST,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// API error as seen by clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationFailed, message)
    }

    pub fn not_found(entity: &str, id: &str) -> Self {
        Self::new(ErrorCode::NotFound, format!("{} not found: {}", entity, id))
    }

    /// Logs the detail and hands the client a generic message.
    pub fn internal(detail: impl std::fmt::Display) -> Self {
        error!(error = %detail, "Internal error");
        Self::new(ErrorCode::Internal, "Internal server error")
    }

    pub fn status(&self) -> StatusCode {
        self.code.status()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

// =============================================================================
// Conversions
// =============================================================================

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::InvalidDateRange => {
                ApiError::new(ErrorCode::InvalidDateRange, err.to_string())
            }
            other => ApiError::validation(other.to_string()),
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let code = match err {
            CoreError::Validation(inner) => return inner.into(),
            CoreError::EmptyOrder => ErrorCode::EmptyOrder,
            CoreError::ProductsNotFound(_) => ErrorCode::ProductsNotFound,
            CoreError::DiscountNotFound(_) => ErrorCode::DiscountNotFound,
            CoreError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            CoreError::AmountOverflow => ErrorCode::ValidationFailed,
        };
        ApiError::new(code, err.to_string())
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { .. } => ApiError::new(ErrorCode::NotFound, err.to_string()),
            DbError::UniqueViolation { .. } | DbError::ForeignKeyViolation { .. } => {
                ApiError::new(ErrorCode::Conflict, err.to_string())
            }
            DbError::InsufficientStock { .. } => {
                ApiError::new(ErrorCode::InsufficientStock, err.to_string())
            }
            DbError::PoolExhausted => {
                error!("Database pool exhausted");
                ApiError::new(ErrorCode::ServiceUnavailable, "Service temporarily unavailable")
            }
            other => ApiError::internal(other),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Database(inner) => inner.into(),
            other => ApiError::new(ErrorCode::Unauthorized, other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_error_status_codes() {
        let cases = [
            (CoreError::EmptyOrder, StatusCode::BAD_REQUEST),
            (
                CoreError::ProductsNotFound(vec!["p-1".to_string()]),
                StatusCode::NOT_FOUND,
            ),
            (
                CoreError::DiscountNotFound("NOPE".to_string()),
                StatusCode::NOT_FOUND,
            ),
            (
                CoreError::InsufficientStock {
                    product: "Kopi".to_string(),
                    available: 1,
                    requested: 2,
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                CoreError::Validation(ValidationError::InvalidDateRange),
                StatusCode::BAD_REQUEST,
            ),
            (CoreError::AmountOverflow, StatusCode::BAD_REQUEST),
        ];

        for (err, status) in cases {
            let api: ApiError = err.into();
            assert_eq!(api.into_response().status(), status);
        }
    }

    #[test]
    fn test_db_error_mapping() {
        let conflict: ApiError = DbError::duplicate("code", "HEMAT10").into();
        assert_eq!(conflict.code, ErrorCode::Conflict);
        assert_eq!(conflict.status(), StatusCode::CONFLICT);

        let busy: ApiError = DbError::PoolExhausted.into();
        assert_eq!(busy.status(), StatusCode::SERVICE_UNAVAILABLE);

        let hidden: ApiError = DbError::QueryFailed("no such table: secrets".to_string()).into();
        assert_eq!(hidden.code, ErrorCode::Internal);
        assert!(!hidden.message.contains("secrets"));
    }

    #[test]
    fn test_auth_error_is_unauthorized() {
        let api: ApiError = AuthError::SessionExpired.into();
        assert_eq!(api.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(api.code, ErrorCode::Unauthorized);
    }

    #[test]
    fn test_error_body_shape() {
        let err = ApiError::from(CoreError::EmptyOrder);
        let body = serde_json::to_value(&err).unwrap();
        assert_eq!(body["code"], "EMPTY_ORDER");
        assert_eq!(body["message"], "Transaction must contain at least one item");
    }
}
