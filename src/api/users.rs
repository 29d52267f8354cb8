//! Account management endpoints: logout, password and email changes, plus
//! admin user administration

use axum::{
    extract::{Path, Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::user::{
        ChangeEmailRequest, ChangePasswordRequest, ForgotPasswordRequest, ResetPasswordRequest,
        SignOutRequest, UpdateUser, UserQuery, UserResponse, VerificationResponse, VerifyOtpParams,
    },
    services::token::TokenService,
};

use super::{AdminUser, AuthenticatedUser};

use super::auth::MessageResponse;

/// Paginated user search results
#[derive(Serialize, ToSchema)]
pub struct UserSearchResponse {
    pub users: Vec<UserResponse>,
    pub total: i64,
}

/// Log out: revoke the presented bearer token.
///
/// Requires re-authentication with email + password on top of the token.
#[utoipa::path(
    post,
    path = "/user/logout",
    tag = "users",
    security(("bearer_auth" = [])),
    request_body = SignOutRequest,
    responses(
        (status = 200, description = "Token revoked", body = MessageResponse),
        (status = 401, description = "Bad password or invalid token"),
        (status = 404, description = "Unknown email"),
        (status = 409, description = "Token already revoked")
    )
)]
pub async fn logout(
    State(state): State<crate::AppState>,
    headers: HeaderMap,
    Json(request): Json<SignOutRequest>,
) -> AppResult<Json<MessageResponse>> {
    let header = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
    let token = TokenService::extract_from_bearer_header(header);

    let message = state.services.auth.logout(request, token).await?;
    Ok(Json(MessageResponse { message }))
}

/// Request a password reset email
#[utoipa::path(
    post,
    path = "/user/forgot-password",
    tag = "users",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Reset email sent", body = MessageResponse)
    )
)]
pub async fn forgot_password(
    State(state): State<crate::AppState>,
    Json(request): Json<ForgotPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    let message = state.services.auth.forgot_password(request).await?;
    Ok(Json(MessageResponse { message }))
}

/// Reset a password to a new value
#[utoipa::path(
    put,
    path = "/user/reset-password",
    tag = "users",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password reset", body = MessageResponse),
        (status = 400, description = "Invalid email or password format"),
        (status = 404, description = "Unknown email")
    )
)]
pub async fn reset_password(
    State(state): State<crate::AppState>,
    Json(request): Json<ResetPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    let message = state.services.auth.reset_password(request).await?;
    Ok(Json(MessageResponse { message }))
}

/// Change the account password (requires the old one)
#[utoipa::path(
    put,
    path = "/user/change-password",
    tag = "users",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 401, description = "Old password mismatch"),
        (status = 404, description = "Unknown email")
    )
)]
pub async fn change_password(
    State(state): State<crate::AppState>,
    Json(request): Json<ChangePasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    let message = state.services.auth.change_password(request).await?;
    Ok(Json(MessageResponse { message }))
}

/// Start an email change: send an OTP to the current address
#[utoipa::path(
    post,
    path = "/user/change-email",
    tag = "users",
    request_body = ChangeEmailRequest,
    responses(
        (status = 200, description = "OTP sent to the old address", body = MessageResponse),
        (status = 404, description = "Unknown email")
    )
)]
pub async fn change_email(
    State(state): State<crate::AppState>,
    Json(request): Json<ChangeEmailRequest>,
) -> AppResult<Json<MessageResponse>> {
    let message = state.services.auth.change_email(request).await?;
    Ok(Json(MessageResponse { message }))
}

/// Confirm an email change with the OTP.
///
/// Failure is reported through the `success` flag with HTTP 400, not as an
/// error body; polling clients branch on the flag.
#[utoipa::path(
    post,
    path = "/user/verify-otp",
    tag = "users",
    params(VerifyOtpParams),
    responses(
        (status = 200, description = "Email changed", body = VerificationResponse),
        (status = 400, description = "OTP mismatch", body = VerificationResponse)
    )
)]
pub async fn verify_otp(
    State(state): State<crate::AppState>,
    Query(params): Query<VerifyOtpParams>,
) -> AppResult<(StatusCode, Json<VerificationResponse>)> {
    let response = state
        .services
        .auth
        .verify_otp(&params.email, &params.new_email, &params.otp)
        .await?;

    let status = if response.success {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    };

    Ok((status, Json(response)))
}

/// Get the authenticated user's own profile
#[utoipa::path(
    get,
    path = "/user/me",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn me(AuthenticatedUser(user): AuthenticatedUser) -> Json<UserResponse> {
    Json(user.into())
}

/// Search users by keyword (admin)
#[utoipa::path(
    get,
    path = "/admin/search_user",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(UserQuery),
    responses(
        (status = 200, description = "Matching users", body = UserSearchResponse),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn search_users(
    State(state): State<crate::AppState>,
    _admin: AdminUser,
    Query(query): Query<UserQuery>,
) -> AppResult<Json<UserSearchResponse>> {
    let (users, total) = state.services.auth.search_users(&query).await?;
    Ok(Json(UserSearchResponse { users, total }))
}

/// Get a user by id (admin)
#[utoipa::path(
    get,
    path = "/admin/get_user/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User", body = UserResponse),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(
    State(state): State<crate::AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> AppResult<Json<UserResponse>> {
    let user = state.services.auth.get_user(id).await?;
    Ok(Json(user))
}

/// Update a user record (admin)
#[utoipa::path(
    put,
    path = "/admin/update_user/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "User ID")),
    request_body = UpdateUser,
    responses(
        (status = 200, description = "Updated user", body = UserResponse),
        (status = 404, description = "User not found")
    )
)]
pub async fn update_user(
    State(state): State<crate::AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
    Json(request): Json<UpdateUser>,
) -> AppResult<Json<UserResponse>> {
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let user = state.services.auth.update_user(id, request).await?;
    Ok(Json(user))
}

/// Delete a user (admin). Cascades to the user's open loans.
#[utoipa::path(
    delete,
    path = "/admin/delete_user/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted", body = MessageResponse),
        (status = 404, description = "User not found")
    )
)]
pub async fn delete_user(
    State(state): State<crate::AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> AppResult<Json<MessageResponse>> {
    let message = state.services.auth.delete_user(id).await?;
    Ok(Json(MessageResponse { message }))
}
