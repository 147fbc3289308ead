//! Sources repository

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{error::AppResult, models::source::Source};

/// Read access to sources
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SourcesStore: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Source>>;
}

#[derive(Clone)]
pub struct SourcesRepository {
    pool: Pool<Postgres>,
}

impl SourcesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SourcesStore for SourcesRepository {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Source>> {
        let source = sqlx::query_as::<_, Source>("SELECT id, title, user_id FROM sources WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(source)
    }
}
