//! Book catalog endpoints (admin)

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookQuery, BookRequest, ImportReport},
};

use super::AdminUser;

use super::auth::MessageResponse;

/// Paginated book search results
#[derive(Serialize, ToSchema)]
pub struct BookSearchResponse {
    pub books: Vec<Book>,
    pub total: i64,
}

/// Search books by keyword
#[utoipa::path(
    get,
    path = "/admin/search_book",
    tag = "books",
    security(("bearer_auth" = [])),
    params(BookQuery),
    responses(
        (status = 200, description = "Matching books", body = BookSearchResponse)
    )
)]
pub async fn search_books(
    State(state): State<crate::AppState>,
    _admin: AdminUser,
    Query(query): Query<BookQuery>,
) -> AppResult<Json<BookSearchResponse>> {
    let (books, total) = state.services.catalog.search_books(&query).await?;
    Ok(Json(BookSearchResponse { books, total }))
}

/// Get a book by id
#[utoipa::path(
    get,
    path = "/admin/get_book/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book", body = Book),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(
    State(state): State<crate::AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Book>> {
    let book = state.services.catalog.get_book(id).await?;
    Ok(Json(book))
}

/// Create a batch of books
#[utoipa::path(
    post,
    path = "/admin/create_book",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = Vec<BookRequest>,
    responses(
        (status = 201, description = "Books created", body = Vec<Book>),
        (status = 400, description = "Invalid book data")
    )
)]
pub async fn create_books(
    State(state): State<crate::AppState>,
    _admin: AdminUser,
    Json(requests): Json<Vec<BookRequest>>,
) -> AppResult<(StatusCode, Json<Vec<Book>>)> {
    for request in &requests {
        request
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
    }

    let books = state.services.catalog.create_books(requests).await?;
    Ok((StatusCode::CREATED, Json(books)))
}

/// Update a book
#[utoipa::path(
    put,
    path = "/admin/update_book/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Book ID")),
    request_body = BookRequest,
    responses(
        (status = 200, description = "Updated book", body = Book),
        (status = 404, description = "Book not found")
    )
)]
pub async fn update_book(
    State(state): State<crate::AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
    Json(request): Json<BookRequest>,
) -> AppResult<Json<Book>> {
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let book = state.services.catalog.update_book(id, request).await?;
    Ok(Json(book))
}

/// Delete a book
#[utoipa::path(
    delete,
    path = "/admin/delete_book/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book deleted", body = MessageResponse),
        (status = 404, description = "Book not found")
    )
)]
pub async fn delete_book(
    State(state): State<crate::AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> AppResult<Json<MessageResponse>> {
    let message = state.services.catalog.delete_book(id).await?;
    Ok(Json(MessageResponse { message }))
}

/// Bulk-import books from a semicolon-separated CSV upload
#[utoipa::path(
    post,
    path = "/admin/import",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body(content = Vec<u8>, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Import processed", body = ImportReport),
        (status = 400, description = "Not a CSV file or file too large")
    )
)]
pub async fn import_books(
    State(state): State<crate::AppState>,
    _admin: AdminUser,
    mut multipart: Multipart,
) -> AppResult<Json<ImportReport>> {
    let max_bytes = state.config.import.max_file_bytes;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart upload: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let is_csv = field
            .file_name()
            .map(|name| name.to_lowercase().ends_with(".csv"))
            .unwrap_or(false)
            || field.content_type() == Some("text/csv");

        if !is_csv {
            return Err(AppError::Validation("File is not in CSV format".to_string()));
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read upload: {}", e)))?;

        if data.len() > max_bytes {
            return Err(AppError::Validation(
                "File size exceeds the maximum allowed limit (5MB)".to_string(),
            ));
        }

        let report = state.services.catalog.import_csv(&data).await?;
        return Ok(Json(report));
    }

    Err(AppError::Validation("No file field in upload".to_string()))
}
