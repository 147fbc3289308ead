//! Service health

use crate::repository::Repository;

#[derive(Clone)]
pub struct HealthService {
    repository: Repository,
}

impl HealthService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Whether the database answers queries
    pub async fn database_available(&self) -> bool {
        match self.repository.health.ping().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Database health check failed: {}", e);
                false
            }
        }
    }
}
