//! Borrowings repository for database operations
//!
//! Borrow and return are check-then-act sequences; each runs in a single
//! transaction with an explicit row lock on the book so two concurrent
//! borrows of the last copy cannot both observe quantity > 0. A partial
//! unique index on (user_id, book_id) WHERE return_date IS NULL backstops
//! the no-double-borrow invariant at the schema level.

use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::borrowing::Borrowing,
};

#[derive(Clone)]
pub struct BorrowingsRepository {
    pool: Pool<Postgres>,
}

impl BorrowingsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get borrowing by ID
    pub async fn get_by_id(&self, id: i64) -> AppResult<Borrowing> {
        sqlx::query_as::<_, Borrowing>("SELECT * FROM borrowings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Borrowing with id {} not found", id)))
    }

    /// Get a user's borrowing history (active loans first)
    pub async fn get_user_borrowings(&self, user_id: i64) -> AppResult<Vec<Borrowing>> {
        let borrowings = sqlx::query_as::<_, Borrowing>(
            r#"
            SELECT * FROM borrowings
            WHERE user_id = $1
            ORDER BY return_date IS NOT NULL, borrow_date DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(borrowings)
    }

    /// Grant a loan: decrement stock and create an active borrowing, atomically.
    pub async fn borrow(&self, user_id: i64, book_id: i64) -> AppResult<Borrowing> {
        let mut tx = self.pool.begin().await?;

        // Lock the book row; serializes stock checks for this book
        let quantity: i32 = sqlx::query_scalar(
            "SELECT quantity FROM books WHERE id = $1 FOR UPDATE",
        )
        .bind(book_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", book_id)))?;

        let user_exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await?;

        if !user_exists {
            return Err(AppError::NotFound(format!("User with id {} not found", user_id)));
        }

        if quantity <= 0 {
            return Err(AppError::OutOfStock);
        }

        let already_borrowed: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM borrowings
                WHERE user_id = $1 AND book_id = $2 AND return_date IS NULL
            )
            "#,
        )
        .bind(user_id)
        .bind(book_id)
        .fetch_one(&mut *tx)
        .await?;

        if already_borrowed {
            return Err(AppError::AlreadyBorrowed);
        }

        sqlx::query("UPDATE books SET quantity = quantity - 1 WHERE id = $1")
            .bind(book_id)
            .execute(&mut *tx)
            .await?;

        let borrowing = sqlx::query_as::<_, Borrowing>(
            r#"
            INSERT INTO borrowings (user_id, book_id, borrow_date)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(book_id)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match &e {
            // The partial unique index catches the race the EXISTS check missed
            sqlx::Error::Database(db) if db.is_unique_violation() => AppError::AlreadyBorrowed,
            _ => AppError::Database(e),
        })?;

        tx.commit().await?;

        Ok(borrowing)
    }

    /// Close a loan: restore stock and stamp the return date, atomically.
    pub async fn return_book(&self, borrowing_id: i64) -> AppResult<(Borrowing, DateTime<Utc>)> {
        let mut tx = self.pool.begin().await?;

        // Lock the borrowing so a second concurrent return sees the stamp
        let borrowing = sqlx::query_as::<_, Borrowing>(
            "SELECT * FROM borrowings WHERE id = $1 FOR UPDATE",
        )
        .bind(borrowing_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("Borrowing with id {} not found", borrowing_id))
        })?;

        if borrowing.return_date.is_some() {
            return Err(AppError::AlreadyReturned);
        }

        sqlx::query("UPDATE books SET quantity = quantity + 1 WHERE id = $1")
            .bind(borrowing.book_id)
            .execute(&mut *tx)
            .await?;

        let returned_date = Utc::now();

        sqlx::query("UPDATE borrowings SET return_date = $1 WHERE id = $2")
            .bind(returned_date)
            .bind(borrowing_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok((borrowing, returned_date))
    }
}
