//! Librarium Server - Library Management Backend

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use librarium_server::{
    api,
    config::AppConfig,
    repository::Repository,
    services::Services,
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("librarium_server={},tower_http=debug", config.logging.level).into());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Librarium Server v{}", env!("CARGO_PKG_VERSION"));

    // Create database connection pool
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    tracing::info!("Database migrations completed");

    // Save server address before moving config
    let server_host = config.server.host.clone();
    let server_port = config.server.port;

    // Create repository and services
    let repository = Repository::new(pool);
    let services = Services::new(
        repository.clone(),
        config.auth.clone(),
        config.email.clone(),
    );

    // Create application state
    let state = AppState {
        config: Arc::new(config),
        repository: Arc::new(repository),
        services: Arc::new(services),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(
        server_host.parse().expect("Invalid host address"),
        server_port,
    );

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // The import body must fit the configured file cap plus multipart
    // framing; the default axum limit (2 MB) is below the cap
    let import_body_limit = state.config.import.max_file_bytes + 64 * 1024;

    // API v1 routes
    let api_v1 = Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        .route("/ready", get(api::health::readiness_check))
        // Authentication
        .route("/auth/signup", post(api::auth::signup))
        .route("/auth/signin", post(api::auth::signin))
        .route("/auth/refresh", post(api::auth::refresh))
        .route("/auth/verify", put(api::auth::verify_email))
        // Account management
        .route("/user/logout", post(api::users::logout))
        .route("/user/forgot-password", post(api::users::forgot_password))
        .route("/user/reset-password", put(api::users::reset_password))
        .route("/user/change-password", put(api::users::change_password))
        .route("/user/change-email", post(api::users::change_email))
        .route("/user/verify-otp", post(api::users::verify_otp))
        .route("/user/me", get(api::users::me))
        // Circulation
        .route("/user/borrow", post(api::circulation::borrow_book))
        .route("/user/return", post(api::circulation::return_book))
        // Admin: book catalog
        .route("/admin/search_book", get(api::books::search_books))
        .route("/admin/get_book/:id", get(api::books::get_book))
        .route("/admin/create_book", post(api::books::create_books))
        .route("/admin/update_book/:id", put(api::books::update_book))
        .route("/admin/delete_book/:id", delete(api::books::delete_book))
        .route(
            "/admin/import",
            post(api::books::import_books).layer(DefaultBodyLimit::max(import_body_limit)),
        )
        // Admin: users
        .route("/admin/search_user", get(api::users::search_users))
        .route("/admin/get_user/:id", get(api::users::get_user))
        .route("/admin/update_user/:id", put(api::users::update_user))
        .route("/admin/delete_user/:id", delete(api::users::delete_user))
        .route("/admin/users/:id/borrowings", get(api::circulation::get_user_borrowings))
        // Admin logout shares the user logout semantics
        .route("/admin/logout", post(api::users::logout))
        .with_state(state.clone());

    // OpenAPI documentation
    let openapi = api::openapi::create_openapi_router();

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
