//! Data models for Librarium

pub mod book;
pub mod borrowing;
pub mod user;

// Re-export commonly used types
pub use book::{Book, ImportReport};
pub use borrowing::Borrowing;
pub use user::{Role, TokenClaims, User};
