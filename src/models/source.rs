//! Source model

use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Source record, as far as notebook linking needs it
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Source {
    pub id: Uuid,
    pub title: Option<String>,
    pub user_id: Option<Uuid>,
}
