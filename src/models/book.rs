//! Book (catalog entry) model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Book model from database
///
/// `quantity` is the number of copies currently on the shelf; the CHECK
/// constraint in the schema keeps it non-negative, the circulation service
/// keeps it correct.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i64,
    pub title: Option<String>,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
}

/// Create/update book request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct BookRequest {
    pub title: Option<String>,
    pub author: Option<String>,
    pub isbn: Option<String>,
    #[validate(range(min = 0, message = "Quantity must be non-negative"))]
    pub quantity: i32,
}

/// Book search query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct BookQuery {
    pub keyword: String,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// A book row parsed out of a CSV import, before persistence.
///
/// `id` is optional: rows carrying one upsert an existing record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportedBook {
    pub id: Option<i64>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub quantity: i32,
}

/// Outcome of a CSV catalog import
#[derive(Debug, Default, Serialize, ToSchema)]
pub struct ImportReport {
    pub imported: usize,
    pub errors: Vec<String>,
}
