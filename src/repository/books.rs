//! Books repository for database operations

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookQuery, BookRequest, ImportedBook},
};

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: i64) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Create a new book
    pub async fn create(&self, book: &BookRequest) -> AppResult<Book> {
        let created = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (title, author, isbn, quantity)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.isbn)
        .bind(book.quantity)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    /// Update an existing book
    pub async fn update(&self, id: i64, book: &BookRequest) -> AppResult<Book> {
        let updated = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET title = $1, author = $2, isbn = $3, quantity = $4
            WHERE id = $5
            RETURNING *
            "#,
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.isbn)
        .bind(book.quantity)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))?;

        Ok(updated)
    }

    /// Delete a book
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }

        Ok(())
    }

    /// Persist a batch of imported rows in one transaction.
    ///
    /// Rows carrying an id upsert the existing record; the rest insert.
    pub async fn save_imported(&self, books: &[ImportedBook]) -> AppResult<usize> {
        let mut tx = self.pool.begin().await?;

        for book in books {
            match book.id {
                Some(id) => {
                    sqlx::query(
                        r#"
                        INSERT INTO books (id, title, author, isbn, quantity)
                        VALUES ($1, $2, $3, $4, $5)
                        ON CONFLICT (id) DO UPDATE
                        SET title = EXCLUDED.title, author = EXCLUDED.author,
                            isbn = EXCLUDED.isbn, quantity = EXCLUDED.quantity
                        "#,
                    )
                    .bind(id)
                    .bind(&book.title)
                    .bind(&book.author)
                    .bind(&book.isbn)
                    .bind(book.quantity)
                    .execute(&mut *tx)
                    .await?;
                }
                None => {
                    sqlx::query(
                        "INSERT INTO books (title, author, isbn, quantity) VALUES ($1, $2, $3, $4)",
                    )
                    .bind(&book.title)
                    .bind(&book.author)
                    .bind(&book.isbn)
                    .bind(book.quantity)
                    .execute(&mut *tx)
                    .await?;
                }
            }
        }

        // Explicit-id inserts bypass nextval; move the sequence past them so
        // later plain inserts cannot draw a colliding id
        if books.iter().any(|b| b.id.is_some()) {
            sqlx::query(
                "SELECT setval('books_id_seq', GREATEST((SELECT COALESCE(MAX(id), 1) FROM books), 1))",
            )
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(books.len())
    }

    /// Search books by keyword over title/author/isbn
    pub async fn search(&self, query: &BookQuery) -> AppResult<(Vec<Book>, i64)> {
        let page = query.page.unwrap_or(0).max(0);
        let per_page = query.per_page.unwrap_or(10).clamp(1, 100);
        let pattern = format!("%{}%", query.keyword.to_lowercase());

        let books = sqlx::query_as::<_, Book>(
            r#"
            SELECT * FROM books
            WHERE LOWER(title) LIKE $1
               OR LOWER(author) LIKE $1
               OR LOWER(isbn) LIKE $1
            ORDER BY id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(&pattern)
        .bind(per_page)
        .bind(page * per_page)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM books
            WHERE LOWER(title) LIKE $1
               OR LOWER(author) LIKE $1
               OR LOWER(isbn) LIKE $1
            "#,
        )
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await?;

        Ok((books, total))
    }
}
