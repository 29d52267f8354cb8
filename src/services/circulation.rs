//! Circulation service: the borrow/return workflow
//!
//! Thin orchestration over the borrowings repository, which owns the
//! transactional invariants (stock never negative, one active loan per
//! user per book, returns close a loan exactly once).

use crate::{
    error::AppResult,
    models::borrowing::{
        Borrowing, BorrowBookRequest, BorrowBookResponse, ReturnBookRequest, ReturnBookResponse,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct CirculationService {
    repository: Repository,
}

impl CirculationService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Borrow a book for a user
    pub async fn borrow_book(&self, request: BorrowBookRequest) -> AppResult<BorrowBookResponse> {
        let borrowing = self
            .repository
            .borrowings
            .borrow(request.user_id, request.book_id)
            .await?;

        tracing::info!(
            "User {} borrowed book {} (borrowing {})",
            request.user_id,
            request.book_id,
            borrowing.id
        );

        Ok(BorrowBookResponse {
            message: "Book borrowed successfully".to_string(),
            borrowing_id: borrowing.id,
            user_id: request.user_id,
            book_id: request.book_id,
        })
    }

    /// Return a borrowed book
    pub async fn return_book(&self, request: ReturnBookRequest) -> AppResult<ReturnBookResponse> {
        let (borrowing, returned_date) = self
            .repository
            .borrowings
            .return_book(request.borrowing_id)
            .await?;

        tracing::info!(
            "Borrowing {} returned (book {})",
            borrowing.id,
            borrowing.book_id
        );

        Ok(ReturnBookResponse {
            message: "Book returned successfully".to_string(),
            borrowing_id: borrowing.id,
            returned_date,
        })
    }

    /// List a user's borrowings, active first
    pub async fn get_user_borrowings(&self, user_id: i64) -> AppResult<Vec<Borrowing>> {
        self.repository.borrowings.get_user_borrowings(user_id).await
    }
}
