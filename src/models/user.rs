//! User model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// User roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

// SQLx conversion for Role (stored as TEXT)
impl sqlx::Type<Postgres> for Role {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for Role {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for Role {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        let s: String = self.as_str().to_string();
        <String as Encode<Postgres>>::encode(s, buf)
    }
}

/// Full user model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: i64,
    pub email: String,
    /// Hashed password (argon2)
    #[serde(skip_serializing)]
    pub password: String,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub role: Role,
    pub verified: bool,
    /// Single-use email verification token, cleared on first successful verify
    #[serde(skip_serializing)]
    pub verification_token: Option<String>,
    /// Single-use OTP for a pending email change
    #[serde(skip_serializing)]
    pub otp: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// JWT claim set: subject (email), issued-at and expiry.
///
/// Access and refresh tokens share this shape; they differ only in the
/// lifetime the issuer applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

impl TokenClaims {
    /// Sign the claims into a JWT
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse and signature-verify a JWT, rejecting expired tokens
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    /// Parse and signature-verify a JWT without the expiry check.
    ///
    /// Used to recover the subject from tokens whose validity is decided
    /// separately (refresh, logout).
    pub fn from_token_ignore_expiry(
        token: &str,
        secret: &str,
    ) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let mut validation = Validation::default();
        validation.validate_exp = false;
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &validation,
        )?;
        Ok(token_data.claims)
    }
}

/// Public user representation (never exposes credentials)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub role: Role,
    pub verified: bool,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id,
            email: user.email,
            firstname: user.firstname,
            lastname: user.lastname,
            role: user.role,
            verified: user.verified,
        }
    }
}

/// Signup request
#[derive(Debug, Deserialize, ToSchema)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
}

/// Signin request
#[derive(Debug, Deserialize, ToSchema)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

/// Signout request: logout re-authenticates with email + password
#[derive(Debug, Deserialize, ToSchema)]
pub struct SignOutRequest {
    pub email: String,
    pub password: String,
}

/// Refresh token request
#[derive(Debug, Deserialize, ToSchema)]
pub struct RefreshTokenRequest {
    pub token: String,
}

/// Forgot password request
#[derive(Debug, Deserialize, ToSchema)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// Reset password request
#[derive(Debug, Deserialize, ToSchema)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub new_password: String,
}

/// Change password request
#[derive(Debug, Deserialize, ToSchema)]
pub struct ChangePasswordRequest {
    pub email: String,
    pub old_password: String,
    pub new_password: String,
}

/// Change email request (phase 1: send OTP to the old address)
#[derive(Debug, Deserialize, ToSchema)]
pub struct ChangeEmailRequest {
    pub old_email: String,
}

/// OTP verification parameters (phase 2 of an email change)
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct VerifyOtpParams {
    pub email: String,
    pub new_email: String,
    pub otp: String,
}

/// Admin user update request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateUser {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub role: Role,
}

/// User search query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct UserQuery {
    pub keyword: String,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Token pair returned by signin and refresh
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthTokens {
    pub token: String,
    pub refresh_token: String,
}

/// Result of a verification step (email verify, OTP confirm).
///
/// OTP confirmation deliberately reports failure through `success` rather
/// than an error response, so verification UIs can poll on it.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VerificationResponse {
    pub success: bool,
    pub message: String,
}
