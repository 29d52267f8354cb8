//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, books, circulation, health, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Librarium API",
        version = "0.1.0",
        description = "Library Management Backend REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::signup,
        auth::signin,
        auth::refresh,
        auth::verify_email,
        // Users
        users::logout,
        users::forgot_password,
        users::reset_password,
        users::change_password,
        users::change_email,
        users::verify_otp,
        users::me,
        users::search_users,
        users::get_user,
        users::update_user,
        users::delete_user,
        // Books
        books::search_books,
        books::get_book,
        books::create_books,
        books::update_book,
        books::delete_book,
        books::import_books,
        // Circulation
        circulation::borrow_book,
        circulation::return_book,
        circulation::get_user_borrowings,
    ),
    components(
        schemas(
            // Auth
            auth::MessageResponse,
            crate::models::user::SignUpRequest,
            crate::models::user::SignInRequest,
            crate::models::user::SignOutRequest,
            crate::models::user::RefreshTokenRequest,
            crate::models::user::ForgotPasswordRequest,
            crate::models::user::ResetPasswordRequest,
            crate::models::user::ChangePasswordRequest,
            crate::models::user::ChangeEmailRequest,
            crate::models::user::AuthTokens,
            crate::models::user::VerificationResponse,
            // Users
            crate::models::user::Role,
            crate::models::user::UserResponse,
            crate::models::user::UpdateUser,
            users::UserSearchResponse,
            // Books
            crate::models::book::Book,
            crate::models::book::BookRequest,
            crate::models::book::ImportReport,
            books::BookSearchResponse,
            // Circulation
            crate::models::borrowing::Borrowing,
            crate::models::borrowing::BorrowBookRequest,
            crate::models::borrowing::ReturnBookRequest,
            crate::models::borrowing::BorrowBookResponse,
            crate::models::borrowing::ReturnBookResponse,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "users", description = "Account management"),
        (name = "admin", description = "User administration"),
        (name = "books", description = "Book catalog management"),
        (name = "circulation", description = "Borrow and return workflow")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
