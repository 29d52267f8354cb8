//! API handlers for Librarium REST endpoints

pub mod auth;
pub mod books;
pub mod circulation;
pub mod health;
pub mod openapi;
pub mod users;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::{
    error::AppError,
    models::user::{Role, User},
    services::token::TokenService,
    AppState,
};

/// Extractor for the authenticated user behind a bearer token.
///
/// Verifies signature and expiry, resolves the subject to a user record and
/// checks the token against that user's revocation list. Handlers behind
/// this extractor never re-validate the token themselves.
pub struct AuthenticatedUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());

        // Absent or malformed header short-circuits to an authorization
        // failure, never an internal error
        let token = TokenService::extract_from_bearer_header(header)
            .ok_or_else(|| AppError::InvalidToken("Missing or invalid authorization header".to_string()))?;

        let subject = state.services.tokens.extract_subject(token)?;

        let user = state
            .repository
            .users
            .get_by_email(&subject)
            .await?
            .ok_or_else(|| AppError::InvalidToken("Unknown token subject".to_string()))?;

        if !state.services.tokens.validate(token, &user).await? {
            return Err(AppError::InvalidToken("Token is expired or revoked".to_string()));
        }

        Ok(AuthenticatedUser(user))
    }
}

/// Extractor that additionally requires the admin role
pub struct AdminUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let AuthenticatedUser(user) = AuthenticatedUser::from_request_parts(parts, state).await?;

        if user.role != Role::Admin {
            return Err(AppError::Authorization(
                "Administrator privileges required".to_string(),
            ));
        }

        Ok(AdminUser(user))
    }
}
