//! Authentication endpoints: signup, signin, refresh, email verification

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::AppResult,
    models::user::{
        AuthTokens, RefreshTokenRequest, SignInRequest, SignUpRequest, VerificationResponse,
    },
};

/// Message-only response body
#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Deserialize, IntoParams)]
pub struct VerifyParams {
    /// Verification token from the signup email
    pub token: String,
}

/// Register a new user account
#[utoipa::path(
    post,
    path = "/auth/signup",
    tag = "auth",
    request_body = SignUpRequest,
    responses(
        (status = 201, description = "Account created, verification email sent", body = MessageResponse),
        (status = 400, description = "Invalid email or password format"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn signup(
    State(state): State<crate::AppState>,
    Json(request): Json<SignUpRequest>,
) -> AppResult<(StatusCode, Json<MessageResponse>)> {
    let message = state.services.auth.signup(request).await?;
    Ok((StatusCode::CREATED, Json(MessageResponse { message })))
}

/// Sign in and receive an access + refresh token pair
#[utoipa::path(
    post,
    path = "/auth/signin",
    tag = "auth",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Authenticated", body = AuthTokens),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Email not verified"),
        (status = 404, description = "Unknown email")
    )
)]
pub async fn signin(
    State(state): State<crate::AppState>,
    Json(request): Json<SignInRequest>,
) -> AppResult<Json<AuthTokens>> {
    let tokens = state.services.auth.signin(request).await?;
    Ok(Json(tokens))
}

/// Exchange a refresh token for a new access token
#[utoipa::path(
    post,
    path = "/auth/refresh",
    tag = "auth",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "New access token issued", body = AuthTokens),
        (status = 401, description = "Invalid or malformed refresh token"),
        (status = 404, description = "Token subject no longer exists")
    )
)]
pub async fn refresh(
    State(state): State<crate::AppState>,
    Json(request): Json<RefreshTokenRequest>,
) -> AppResult<Json<AuthTokens>> {
    let tokens = state.services.auth.refresh(request).await?;
    Ok(Json(tokens))
}

/// Verify an email address with the token from the signup email
#[utoipa::path(
    put,
    path = "/auth/verify",
    tag = "auth",
    params(VerifyParams),
    responses(
        (status = 200, description = "Email verified", body = VerificationResponse),
        (status = 401, description = "Expired token or already verified"),
        (status = 404, description = "Unknown verification token")
    )
)]
pub async fn verify_email(
    State(state): State<crate::AppState>,
    Query(params): Query<VerifyParams>,
) -> AppResult<Json<VerificationResponse>> {
    let response = state.services.auth.verify_email(&params.token).await?;
    Ok(Json(response))
}
