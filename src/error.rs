//! Error types for Librarium server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application error codes exposed in API error bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Success = 0,
    Failure = 1,
    NotAuthorized = 2,
    DbFailure = 3,
    NotFound = 4,
    OutOfStock = 7,
    DuplicateEmail = 8,
    NotVerified = 9,
    InvalidToken = 10,
    MalformedToken = 11,
    AlreadyRevoked = 12,
    AlreadyBorrowed = 13,
    AlreadyReturned = 14,
    InvalidOtp = 15,
    BadValue = 16,
}

/// Main application error type
///
/// All variants except `Database` and `Internal` are expected, recoverable
/// caller outcomes and never terminate the process.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Email has already been registered: {0}")]
    DuplicateEmail(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Email has not been verified")]
    NotVerified,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Malformed token")]
    MalformedToken,

    #[error("Token has already been logged out")]
    AlreadyRevoked,

    #[error("The book is out of stock")]
    OutOfStock,

    #[error("You have already borrowed this book")]
    AlreadyBorrowed,

    #[error("This book has already been returned")]
    AlreadyReturned,

    #[error("Invalid or expired OTP")]
    InvalidOtp,

    #[error("Authorization failed: {0}")]
    Authorization(String),

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
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, ErrorCode::BadValue, msg.clone())
            }
            AppError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, ErrorCode::NotFound, msg.clone())
            }
            AppError::DuplicateEmail(_) => {
                (StatusCode::CONFLICT, ErrorCode::DuplicateEmail, self.to_string())
            }
            AppError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, ErrorCode::NotAuthorized, self.to_string())
            }
            AppError::NotVerified => {
                (StatusCode::FORBIDDEN, ErrorCode::NotVerified, self.to_string())
            }
            AppError::InvalidToken(_) => {
                (StatusCode::UNAUTHORIZED, ErrorCode::InvalidToken, self.to_string())
            }
            AppError::MalformedToken => {
                (StatusCode::UNAUTHORIZED, ErrorCode::MalformedToken, self.to_string())
            }
            AppError::AlreadyRevoked => {
                (StatusCode::CONFLICT, ErrorCode::AlreadyRevoked, self.to_string())
            }
            AppError::OutOfStock => {
                (StatusCode::CONFLICT, ErrorCode::OutOfStock, self.to_string())
            }
            AppError::AlreadyBorrowed => {
                (StatusCode::CONFLICT, ErrorCode::AlreadyBorrowed, self.to_string())
            }
            AppError::AlreadyReturned => {
                (StatusCode::CONFLICT, ErrorCode::AlreadyReturned, self.to_string())
            }
            AppError::InvalidOtp => {
                (StatusCode::BAD_REQUEST, ErrorCode::InvalidOtp, self.to_string())
            }
            AppError::Authorization(msg) => {
                (StatusCode::FORBIDDEN, ErrorCode::NotAuthorized, msg.clone())
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

    #[test]
    fn missing_entities_share_one_not_found_code() {
        for err in [
            AppError::NotFound("User with id 1 not found".to_string()),
            AppError::NotFound("Book with id 1 not found".to_string()),
            AppError::NotFound("Borrowing with id 1 not found".to_string()),
        ] {
            let response = err.into_response();
            assert_eq!(response.status(), StatusCode::NOT_FOUND);
        }

        assert_eq!(ErrorCode::NotFound as u32, 4);
        assert_eq!(format!("{:?}", ErrorCode::NotFound), "NotFound");
    }

    #[test]
    fn conflict_variants_map_to_409() {
        for err in [
            AppError::OutOfStock,
            AppError::AlreadyBorrowed,
            AppError::AlreadyReturned,
            AppError::AlreadyRevoked,
            AppError::DuplicateEmail("a@x.com".to_string()),
        ] {
            assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
        }
    }
}
