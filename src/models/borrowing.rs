//! Borrowing (loan) model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// A loan record. Active while `return_date` is unset; once stamped it is
/// terminal. Rows are append-only history and are never deleted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Borrowing {
    pub id: i64,
    pub user_id: i64,
    pub book_id: i64,
    pub borrow_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
}

/// Borrow request
#[derive(Debug, Deserialize, ToSchema)]
pub struct BorrowBookRequest {
    pub user_id: i64,
    pub book_id: i64,
}

/// Return request
#[derive(Debug, Deserialize, ToSchema)]
pub struct ReturnBookRequest {
    pub borrowing_id: i64,
}

/// Borrow response
#[derive(Debug, Serialize, ToSchema)]
pub struct BorrowBookResponse {
    pub message: String,
    pub borrowing_id: i64,
    pub user_id: i64,
    pub book_id: i64,
}

/// Return response
#[derive(Debug, Serialize, ToSchema)]
pub struct ReturnBookResponse {
    pub message: String,
    pub borrowing_id: i64,
    pub returned_date: DateTime<Utc>,
}
