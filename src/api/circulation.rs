//! Borrow/return endpoints

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    error::AppResult,
    models::borrowing::{
        Borrowing, BorrowBookRequest, BorrowBookResponse, ReturnBookRequest, ReturnBookResponse,
    },
};

use super::{AdminUser, AuthenticatedUser};

/// Borrow a book
#[utoipa::path(
    post,
    path = "/user/borrow",
    tag = "circulation",
    security(("bearer_auth" = [])),
    request_body = BorrowBookRequest,
    responses(
        (status = 200, description = "Book borrowed", body = BorrowBookResponse),
        (status = 404, description = "User or book not found"),
        (status = 409, description = "Out of stock or already borrowed")
    )
)]
pub async fn borrow_book(
    State(state): State<crate::AppState>,
    _user: AuthenticatedUser,
    Json(request): Json<BorrowBookRequest>,
) -> AppResult<Json<BorrowBookResponse>> {
    let response = state.services.circulation.borrow_book(request).await?;
    Ok(Json(response))
}

/// Return a borrowed book
#[utoipa::path(
    post,
    path = "/user/return",
    tag = "circulation",
    security(("bearer_auth" = [])),
    request_body = ReturnBookRequest,
    responses(
        (status = 200, description = "Book returned", body = ReturnBookResponse),
        (status = 404, description = "Borrowing not found"),
        (status = 409, description = "Already returned")
    )
)]
pub async fn return_book(
    State(state): State<crate::AppState>,
    _user: AuthenticatedUser,
    Json(request): Json<ReturnBookRequest>,
) -> AppResult<Json<ReturnBookResponse>> {
    let response = state.services.circulation.return_book(request).await?;
    Ok(Json(response))
}

/// List a user's borrowings (admin)
#[utoipa::path(
    get,
    path = "/admin/users/{id}/borrowings",
    tag = "circulation",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User's borrowings", body = Vec<Borrowing>)
    )
)]
pub async fn get_user_borrowings(
    State(state): State<crate::AppState>,
    _admin: AdminUser,
    Path(user_id): Path<i64>,
) -> AppResult<Json<Vec<Borrowing>>> {
    let borrowings = state
        .services
        .circulation
        .get_user_borrowings(user_id)
        .await?;
    Ok(Json(borrowings))
}
