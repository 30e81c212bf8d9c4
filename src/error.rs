//! Error types for the library server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Numeric error codes carried in every error body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    NotFound = 1,
    UnknownAuthor = 2,
    UnknownBook = 3,
    UnknownBorrower = 4,
    AlreadyBorrowed = 5,
    NotCurrentlyBorrowed = 6,
    BookBorrowed = 7,
    AuthorInUse = 8,
    BorrowerHasLoans = 9,
    BadValue = 10,
    StorageFailure = 11,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Author with id {0} does not exist")]
    UnknownAuthor(i64),

    #[error("Book with id {0} does not exist")]
    UnknownBook(i64),

    #[error("Borrower with id {0} does not exist")]
    UnknownBorrower(i64),

    #[error("Book {0} is already borrowed")]
    AlreadyBorrowed(i64),

    #[error("Book {0} is not currently borrowed")]
    NotCurrentlyBorrowed(i64),

    #[error("Book {0} is on loan and cannot be deleted")]
    BookBorrowed(i64),

    #[error("Author {0} is referenced by books and cannot be deleted")]
    AuthorInUse(i64),

    #[error("Borrower {0} has loan records and cannot be deleted")]
    BorrowerHasLoans(i64),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage failure: {0}")]
    Storage(#[from] sqlx::Error),
}

impl AppError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::NotFound(_) => ErrorCode::NotFound,
            AppError::UnknownAuthor(_) => ErrorCode::UnknownAuthor,
            AppError::UnknownBook(_) => ErrorCode::UnknownBook,
            AppError::UnknownBorrower(_) => ErrorCode::UnknownBorrower,
            AppError::AlreadyBorrowed(_) => ErrorCode::AlreadyBorrowed,
            AppError::NotCurrentlyBorrowed(_) => ErrorCode::NotCurrentlyBorrowed,
            AppError::BookBorrowed(_) => ErrorCode::BookBorrowed,
            AppError::AuthorInUse(_) => ErrorCode::AuthorInUse,
            AppError::BorrowerHasLoans(_) => ErrorCode::BorrowerHasLoans,
            AppError::Validation(_) => ErrorCode::BadValue,
            AppError::Storage(_) => ErrorCode::StorageFailure,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_)
            | AppError::UnknownAuthor(_)
            | AppError::UnknownBook(_)
            | AppError::UnknownBorrower(_) => StatusCode::NOT_FOUND,
            AppError::AlreadyBorrowed(_)
            | AppError::NotCurrentlyBorrowed(_)
            | AppError::BookBorrowed(_)
            | AppError::AuthorInUse(_)
            | AppError::BorrowerHasLoans(_) => StatusCode::CONFLICT,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
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
        let code = self.code();
        let message = match &self {
            AppError::Storage(e) => {
                tracing::error!("Storage failure: {:?}", e);
                "Storage failure".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message,
        });

        (self.status(), body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

/// True when SQLite rejected a write on a UNIQUE constraint or index
pub(crate) fn is_unique_violation(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(db_err) => db_err.message().contains("UNIQUE constraint failed"),
        _ => false,
    }
}
