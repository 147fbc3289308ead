//! Repository layer for database operations

pub mod health;
pub mod notebooks;
pub mod sources;
pub mod users;

use std::sync::Arc;

use sqlx::{Pool, Postgres};

pub use health::HealthStore;
pub use notebooks::NotebooksStore;
pub use sources::SourcesStore;
pub use users::UsersStore;

/// Main repository struct holding the stores used by the services
#[derive(Clone)]
pub struct Repository {
    pub users: Arc<dyn UsersStore>,
    pub notebooks: Arc<dyn NotebooksStore>,
    pub sources: Arc<dyn SourcesStore>,
    pub health: Arc<dyn HealthStore>,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            users: Arc::new(users::UsersRepository::new(pool.clone())),
            notebooks: Arc::new(notebooks::NotebooksRepository::new(pool.clone())),
            sources: Arc::new(sources::SourcesRepository::new(pool.clone())),
            health: Arc::new(health::HealthRepository::new(pool)),
        }
    }

    /// Assemble a repository from arbitrary store implementations
    pub fn from_stores(
        users: Arc<dyn UsersStore>,
        notebooks: Arc<dyn NotebooksStore>,
        sources: Arc<dyn SourcesStore>,
        health: Arc<dyn HealthStore>,
    ) -> Self {
        Self {
            users,
            notebooks,
            sources,
            health,
        }
    }
}
