//! Error types for Corvina server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Stable application error codes exposed to API clients
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Success = 0,
    Failure = 1,
    NotAuthenticated = 2,
    NotAuthorized = 3,
    DbFailure = 4,
    NoSuchUser = 5,
    NoSuchBook = 6,
    NoSuchLoan = 7,
    BookUnavailable = 8,
    AlreadyLoaned = 9,
    DuplicateEmail = 10,
    InvalidLoanType = 11,
    AdminSecretInvalid = 12,
    BadValue = 13,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Authorization failed: {0}")]
    Authorization(String),

    #[error("User with id {0} not found")]
    UserNotFound(i32),

    #[error("Book with id {0} not found")]
    BookNotFound(i32),

    #[error("Loan with id {0} not found")]
    LoanNotFound(i32),

    #[error("All copies of the book are currently on loan")]
    BookUnavailable,

    #[error("Book is already on loan to this user")]
    AlreadyLoaned,

    #[error("Email address is already registered")]
    DuplicateEmail,

    #[error("Unrecognized loan type {0}")]
    InvalidLoanType(i16),

    #[error("Admin provisioning secret is incorrect")]
    AdminSecretInvalid,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Authentication(msg) => {
                (StatusCode::UNAUTHORIZED, ErrorCode::NotAuthenticated, msg.clone())
            }
            AppError::Authorization(msg) => {
                (StatusCode::FORBIDDEN, ErrorCode::NotAuthorized, msg.clone())
            }
            AppError::UserNotFound(_) => {
                (StatusCode::NOT_FOUND, ErrorCode::NoSuchUser, self.to_string())
            }
            AppError::BookNotFound(_) => {
                (StatusCode::NOT_FOUND, ErrorCode::NoSuchBook, self.to_string())
            }
            AppError::LoanNotFound(_) => {
                (StatusCode::NOT_FOUND, ErrorCode::NoSuchLoan, self.to_string())
            }
            AppError::BookUnavailable => {
                (StatusCode::CONFLICT, ErrorCode::BookUnavailable, self.to_string())
            }
            AppError::AlreadyLoaned => {
                (StatusCode::CONFLICT, ErrorCode::AlreadyLoaned, self.to_string())
            }
            AppError::DuplicateEmail => {
                (StatusCode::CONFLICT, ErrorCode::DuplicateEmail, self.to_string())
            }
            AppError::InvalidLoanType(_) => {
                (StatusCode::BAD_REQUEST, ErrorCode::InvalidLoanType, self.to_string())
            }
            AppError::AdminSecretInvalid => {
                (StatusCode::BAD_REQUEST, ErrorCode::AdminSecretInvalid, self.to_string())
            }
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, ErrorCode::BadValue, msg.clone())
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::DbFailure,
                    "Database error".to_string(),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::Failure,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn not_found_variants_map_to_404() {
        for err in [
            AppError::UserNotFound(1),
            AppError::BookNotFound(1),
            AppError::LoanNotFound(1),
        ] {
            assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
        }
    }

    #[test]
    fn conflict_variants_map_to_409() {
        for err in [
            AppError::AlreadyLoaned,
            AppError::BookUnavailable,
            AppError::DuplicateEmail,
        ] {
            assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
        }
    }

    #[test]
    fn database_errors_are_redacted() {
        let err = AppError::Database(sqlx::Error::RowNotFound);
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
