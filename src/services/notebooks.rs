//! Notebooks service

use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::notebook::{CreateNotebook, NewNotebook, Notebook, NotebookOrder, NotebookQuery, UpdateNotebook},
    repository::Repository,
};

/// Reject access when the record belongs to someone other than the requester.
///
/// Without a requesting user (single-user mode) and for unowned records the
/// check always passes.
pub fn ensure_owner(owner: Option<Uuid>, requester: Option<Uuid>, message: &str) -> AppResult<()> {
    match (owner, requester) {
        (Some(owner), Some(requester)) if owner != requester => {
            Err(AppError::Authorization(message.to_string()))
        }
        _ => Ok(()),
    }
}

fn validate_name(name: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Notebook name cannot be empty".to_string()));
    }
    Ok(name.to_string())
}

#[derive(Clone)]
pub struct NotebooksService {
    repository: Repository,
}

impl NotebooksService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// List notebooks visible to the requester
    pub async fn list(
        &self,
        requester: Option<Uuid>,
        query: &NotebookQuery,
    ) -> AppResult<Vec<Notebook>> {
        let order = match query.order_by.as_deref() {
            Some(raw) => raw.parse::<NotebookOrder>()?,
            None => NotebookOrder::default(),
        };
        self.repository
            .notebooks
            .list(requester, query.archived, order)
            .await
    }

    pub async fn create(&self, requester: Option<Uuid>, data: &CreateNotebook) -> AppResult<Notebook> {
        let name = validate_name(&data.name)?;
        let notebook = self
            .repository
            .notebooks
            .create(&NewNotebook {
                name,
                description: data.description.clone(),
                user_id: requester,
            })
            .await?;
        tracing::info!("Created notebook {}", notebook.id);
        Ok(notebook)
    }

    /// Fetch a notebook the requester may access
    pub async fn get(&self, requester: Option<Uuid>, id: Uuid) -> AppResult<Notebook> {
        let notebook = self
            .repository
            .notebooks
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Notebook not found".to_string()))?;
        ensure_owner(notebook.user_id, requester, "Access denied")?;
        Ok(notebook)
    }

    pub async fn update(
        &self,
        requester: Option<Uuid>,
        id: Uuid,
        data: &UpdateNotebook,
    ) -> AppResult<Notebook> {
        self.get(requester, id).await?;

        let changes = UpdateNotebook {
            name: data.name.as_deref().map(validate_name).transpose()?,
            description: data.description.clone(),
            archived: data.archived,
        };

        self.repository
            .notebooks
            .update(id, &changes)
            .await?
            .ok_or_else(|| AppError::NotFound("Notebook not found".to_string()))
    }

    pub async fn delete(&self, requester: Option<Uuid>, id: Uuid) -> AppResult<()> {
        self.get(requester, id).await?;
        if !self.repository.notebooks.delete(id).await? {
            return Err(AppError::NotFound("Notebook not found".to_string()));
        }
        tracing::info!("Deleted notebook {}", id);
        Ok(())
    }

    /// Link a source to a notebook; linking twice is a no-op.
    ///
    /// `source_id` is `None` when the caller's id did not parse; that only
    /// surfaces as a missing source once the notebook checks have passed.
    pub async fn add_source(
        &self,
        requester: Option<Uuid>,
        notebook_id: Uuid,
        source_id: Option<Uuid>,
    ) -> AppResult<()> {
        let notebook = self
            .repository
            .notebooks
            .get(notebook_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Notebook not found".to_string()))?;
        ensure_owner(notebook.user_id, requester, "Access denied to notebook")?;

        let source_id =
            source_id.ok_or_else(|| AppError::NotFound("Source not found".to_string()))?;
        let source = self
            .repository
            .sources
            .get_by_id(source_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Source not found".to_string()))?;
        ensure_owner(source.user_id, requester, "Access denied to source")?;

        if !self
            .repository
            .notebooks
            .reference_exists(source_id, notebook_id)
            .await?
        {
            self.repository
                .notebooks
                .add_reference(source_id, notebook_id)
                .await?;
        }
        Ok(())
    }

    /// Remove the reference edge between a source and a notebook, if any.
    ///
    /// The source itself is never looked up; an unparseable id has no edge.
    pub async fn remove_source(
        &self,
        requester: Option<Uuid>,
        notebook_id: Uuid,
        source_id: Option<Uuid>,
    ) -> AppResult<()> {
        self.get(requester, notebook_id).await?;
        let Some(source_id) = source_id else {
            return Ok(());
        };
        let removed = self
            .repository
            .notebooks
            .remove_reference(source_id, notebook_id)
            .await?;
        tracing::debug!(
            "Removed {} reference edge(s) between source {} and notebook {}",
            removed,
            source_id,
            notebook_id
        );
        Ok(())
    }
}
