//! Notebooks repository
//!
//! Graph relations are stored as edge tables: `reference_edges` links a
//! source to a notebook and `artifact_edges` links a note to a notebook.
//! Edge counts are computed by the database on every read.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::notebook::{NewNotebook, Notebook, NotebookOrder, UpdateNotebook},
};

const NOTEBOOK_SELECT: &str = r#"
    SELECT n.id, n.name, n.description, n.archived, n.user_id, n.created, n.updated,
           (SELECT COUNT(*) FROM reference_edges r WHERE r.notebook_id = n.id)::bigint AS source_count,
           (SELECT COUNT(*) FROM artifact_edges a WHERE a.notebook_id = n.id)::bigint AS note_count
    FROM notebooks n
"#;

/// Notebook persistence and reference edges
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotebooksStore: Send + Sync {
    /// List notebooks, restricted to `owner` when given
    async fn list(
        &self,
        owner: Option<Uuid>,
        archived: Option<bool>,
        order: NotebookOrder,
    ) -> AppResult<Vec<Notebook>>;
    async fn get(&self, id: Uuid) -> AppResult<Option<Notebook>>;
    async fn create(&self, notebook: &NewNotebook) -> AppResult<Notebook>;
    /// Apply the provided fields; `None` when the notebook does not exist
    async fn update(&self, id: Uuid, changes: &UpdateNotebook) -> AppResult<Option<Notebook>>;
    /// Delete a notebook and its edges; false when nothing was deleted
    async fn delete(&self, id: Uuid) -> AppResult<bool>;
    async fn reference_exists(&self, source_id: Uuid, notebook_id: Uuid) -> AppResult<bool>;
    async fn add_reference(&self, source_id: Uuid, notebook_id: Uuid) -> AppResult<()>;
    /// Returns the number of edges removed
    async fn remove_reference(&self, source_id: Uuid, notebook_id: Uuid) -> AppResult<u64>;
}

#[derive(Clone)]
pub struct NotebooksRepository {
    pool: Pool<Postgres>,
}

impl NotebooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotebooksStore for NotebooksRepository {
    async fn list(
        &self,
        owner: Option<Uuid>,
        archived: Option<bool>,
        order: NotebookOrder,
    ) -> AppResult<Vec<Notebook>> {
        let mut conditions = Vec::new();
        if owner.is_some() {
            conditions.push(format!("n.user_id = ${}", conditions.len() + 1));
        }
        if archived.is_some() {
            conditions.push(format!("n.archived = ${}", conditions.len() + 1));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let query = format!(
            "{} {} ORDER BY {}",
            NOTEBOOK_SELECT,
            where_clause,
            order.sql()
        );

        let mut builder = sqlx::query_as::<_, Notebook>(&query);
        if let Some(owner) = owner {
            builder = builder.bind(owner);
        }
        if let Some(archived) = archived {
            builder = builder.bind(archived);
        }

        let notebooks = builder.fetch_all(&self.pool).await?;
        Ok(notebooks)
    }

    async fn get(&self, id: Uuid) -> AppResult<Option<Notebook>> {
        let query = format!("{} WHERE n.id = $1", NOTEBOOK_SELECT);
        let notebook = sqlx::query_as::<_, Notebook>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(notebook)
    }

    async fn create(&self, notebook: &NewNotebook) -> AppResult<Notebook> {
        let now = Utc::now();

        let created = sqlx::query_as::<_, Notebook>(
            r#"
            INSERT INTO notebooks (id, name, description, archived, user_id, created, updated)
            VALUES ($1, $2, $3, FALSE, $4, $5, $5)
            RETURNING id, name, description, archived, user_id, created, updated,
                      0::bigint AS source_count, 0::bigint AS note_count
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&notebook.name)
        .bind(&notebook.description)
        .bind(notebook.user_id)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn update(&self, id: Uuid, changes: &UpdateNotebook) -> AppResult<Option<Notebook>> {
        let updated: Option<Uuid> = sqlx::query_scalar(
            r#"
            UPDATE notebooks
            SET name = COALESCE($1, name),
                description = COALESCE($2, description),
                archived = COALESCE($3, archived),
                updated = $4
            WHERE id = $5
            RETURNING id
            "#,
        )
        .bind(&changes.name)
        .bind(&changes.description)
        .bind(changes.archived)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(id) => self.get(id).await,
            None => Ok(None),
        }
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM notebooks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn reference_exists(&self, source_id: Uuid, notebook_id: Uuid) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM reference_edges WHERE source_id = $1 AND notebook_id = $2)",
        )
        .bind(source_id)
        .bind(notebook_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn add_reference(&self, source_id: Uuid, notebook_id: Uuid) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO reference_edges (source_id, notebook_id, created)
            VALUES ($1, $2, $3)
            ON CONFLICT (source_id, notebook_id) DO NOTHING
            "#,
        )
        .bind(source_id)
        .bind(notebook_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove_reference(&self, source_id: Uuid, notebook_id: Uuid) -> AppResult<u64> {
        let result =
            sqlx::query("DELETE FROM reference_edges WHERE source_id = $1 AND notebook_id = $2")
                .bind(source_id)
                .bind(notebook_id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected())
    }
}
