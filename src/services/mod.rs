//! Business logic services

pub mod auth;
pub mod catalog;
pub mod circulation;
pub mod email;
pub mod token;

use crate::{
    config::{AuthConfig, EmailConfig},
    repository::Repository,
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub tokens: token::TokenService,
    pub catalog: catalog::CatalogService,
    pub circulation: circulation::CirculationService,
    pub email: email::EmailService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, auth_config: AuthConfig, email_config: EmailConfig) -> Self {
        let tokens = token::TokenService::new(repository.clone(), auth_config);
        let email = email::EmailService::new(email_config);

        Self {
            auth: auth::AuthService::new(repository.clone(), tokens.clone(), email.clone()),
            catalog: catalog::CatalogService::new(repository.clone()),
            circulation: circulation::CirculationService::new(repository),
            tokens,
            email,
        }
    }
}
