//! Business logic services

pub mod health;
pub mod notebooks;
pub mod tokens;
pub mod users;

use crate::{config::AuthConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub users: users::UsersService,
    pub notebooks: notebooks::NotebooksService,
    pub tokens: tokens::TokenService,
    pub health: health::HealthService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, auth_config: &AuthConfig) -> Self {
        let tokens = tokens::TokenService::new(auth_config);
        Self {
            users: users::UsersService::new(repository.clone(), tokens.clone(), auth_config),
            notebooks: notebooks::NotebooksService::new(repository.clone()),
            tokens,
            health: health::HealthService::new(repository),
        }
    }
}
