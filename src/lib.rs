//! Librarium Library Management Backend
//!
//! A Rust backend for library management: user registration and JWT
//! authentication with per-user token revocation, book catalog CRUD with
//! CSV bulk import, and a transactional borrow/return workflow.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub repository: Arc<repository::Repository>,
    pub services: Arc<services::Services>,
}
