//! Users repository for database operations
//!
//! Also owns the per-user revoked-token store. Revocation entries carry the
//! token's own expiry and are pruned on write, so the table stays bounded by
//! the refresh-token TTL window rather than growing with lifetime logouts.

use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::user::{Role, UpdateUser, User, UserQuery},
};

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

/// Fields of a new user record
pub struct NewUser<'a> {
    pub email: &'a str,
    pub password_hash: &'a str,
    pub firstname: Option<&'a str>,
    pub lastname: Option<&'a str>,
    pub role: Role,
    pub verification_token: &'a str,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i64) -> AppResult<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    /// Get user by email
    pub async fn get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE LOWER(email) = LOWER($1)",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Get user by their stored verification token
    pub async fn get_by_verification_token(&self, token: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE verification_token = $1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Check if email already exists
    pub async fn email_exists(&self, email: &str) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER($1))",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    /// Create a new user (unverified)
    pub async fn create(&self, new_user: &NewUser<'_>) -> AppResult<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password, firstname, lastname, role, verified, verification_token)
            VALUES ($1, $2, $3, $4, $5, FALSE, $6)
            RETURNING *
            "#,
        )
        .bind(new_user.email)
        .bind(new_user.password_hash)
        .bind(new_user.firstname)
        .bind(new_user.lastname)
        .bind(new_user.role)
        .bind(new_user.verification_token)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    /// Mark a user verified and clear the single-use verification token
    pub async fn mark_verified(&self, id: i64) -> AppResult<()> {
        sqlx::query("UPDATE users SET verified = TRUE, verification_token = NULL WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Replace the stored password hash
    pub async fn set_password(&self, id: i64, password_hash: &str) -> AppResult<()> {
        sqlx::query("UPDATE users SET password = $1 WHERE id = $2")
            .bind(password_hash)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Store an OTP for a pending email change
    pub async fn set_otp(&self, id: i64, otp: &str) -> AppResult<()> {
        sqlx::query("UPDATE users SET otp = $1 WHERE id = $2")
            .bind(otp)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Apply an email change and clear the single-use OTP
    pub async fn apply_email_change(&self, id: i64, new_email: &str) -> AppResult<()> {
        sqlx::query("UPDATE users SET email = $1, otp = NULL WHERE id = $2")
            .bind(new_email)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Admin update of a user record
    pub async fn update(&self, id: i64, update: &UpdateUser) -> AppResult<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET email = $1, firstname = $2, lastname = $3, role = $4
            WHERE id = $5
            RETURNING *
            "#,
        )
        .bind(&update.email)
        .bind(&update.firstname)
        .bind(&update.lastname)
        .bind(update.role)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))?;

        Ok(user)
    }

    /// Delete a user. Open loans and revocation entries go with it (FK cascade).
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User with id {} not found", id)));
        }

        Ok(())
    }

    /// Search users by keyword over firstname/lastname/email
    pub async fn search(&self, query: &UserQuery) -> AppResult<(Vec<User>, i64)> {
        let page = query.page.unwrap_or(0).max(0);
        let per_page = query.per_page.unwrap_or(10).clamp(1, 100);
        let pattern = format!("%{}%", query.keyword.to_lowercase());

        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users
            WHERE LOWER(firstname) LIKE $1
               OR LOWER(lastname) LIKE $1
               OR LOWER(email) LIKE $1
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
            SELECT COUNT(*) FROM users
            WHERE LOWER(firstname) LIKE $1
               OR LOWER(lastname) LIKE $1
               OR LOWER(email) LIKE $1
            "#,
        )
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await?;

        Ok((users, total))
    }

    /// Check whether a token is on the user's revocation list
    pub async fn is_token_revoked(&self, user_id: i64, token: &str) -> AppResult<bool> {
        let revoked: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM revoked_tokens WHERE user_id = $1 AND token = $2)",
        )
        .bind(user_id)
        .bind(token)
        .fetch_one(&self.pool)
        .await?;

        Ok(revoked)
    }

    /// Add a token to the user's revocation list.
    ///
    /// Runs in a transaction that locks the user row, so two concurrent
    /// logouts for the same user on different tokens lose neither entry.
    /// Expired entries are pruned on the way in. Returns `AlreadyRevoked`
    /// if the token is already listed.
    pub async fn revoke_token(
        &self,
        user_id: i64,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        // Serialize concurrent revocations for this user
        sqlx::query("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", user_id)))?;

        let already: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM revoked_tokens WHERE user_id = $1 AND token = $2)",
        )
        .bind(user_id)
        .bind(token)
        .fetch_one(&mut *tx)
        .await?;

        if already {
            return Err(AppError::AlreadyRevoked);
        }

        // Prune entries whose tokens have expired on their own
        sqlx::query("DELETE FROM revoked_tokens WHERE user_id = $1 AND expires_at < NOW()")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO revoked_tokens (user_id, token, expires_at) VALUES ($1, $2, $3)",
        )
        .bind(user_id)
        .bind(token)
        .bind(expires_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(())
    }
}
