//! Notebook endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use axum_extra::extract::WithRejection;

use crate::{
    error::{AppError, AppResult},
    models::{
        notebook::{CreateNotebook, Notebook, NotebookQuery, UpdateNotebook},
        parse_record_id, MessageResponse,
    },
    AppState,
};

use super::{record_id, RequestUser};

/// List notebooks
#[utoipa::path(
    get,
    path = "/notebooks",
    tag = "notebooks",
    security(("bearer_auth" = [])),
    params(NotebookQuery),
    responses(
        (status = 200, description = "List of notebooks", body = Vec<Notebook>),
        (status = 400, description = "Invalid order_by value")
    )
)]
pub async fn list_notebooks(
    State(state): State<AppState>,
    user: RequestUser,
    Query(query): Query<NotebookQuery>,
) -> AppResult<Json<Vec<Notebook>>> {
    let notebooks = state.services.notebooks.list(user.id(), &query).await?;
    Ok(Json(notebooks))
}

/// Create a notebook owned by the requesting user
#[utoipa::path(
    post,
    path = "/notebooks",
    tag = "notebooks",
    security(("bearer_auth" = [])),
    request_body = CreateNotebook,
    responses(
        (status = 200, description = "Notebook created", body = Notebook),
        (status = 400, description = "Invalid input")
    )
)]
pub async fn create_notebook(
    State(state): State<AppState>,
    user: RequestUser,
    WithRejection(Json(data), _): WithRejection<Json<CreateNotebook>, AppError>,
) -> AppResult<Json<Notebook>> {
    let notebook = state.services.notebooks.create(user.id(), &data).await?;
    Ok(Json(notebook))
}

/// Get notebook by ID
#[utoipa::path(
    get,
    path = "/notebooks/{id}",
    tag = "notebooks",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "Notebook ID")
    ),
    responses(
        (status = 200, description = "Notebook details", body = Notebook),
        (status = 403, description = "Access denied"),
        (status = 404, description = "Notebook not found")
    )
)]
pub async fn get_notebook(
    State(state): State<AppState>,
    user: RequestUser,
    Path(id): Path<String>,
) -> AppResult<Json<Notebook>> {
    let id = record_id("notebook", &id, "Notebook not found")?;
    let notebook = state.services.notebooks.get(user.id(), id).await?;
    Ok(Json(notebook))
}

/// Update a notebook
#[utoipa::path(
    put,
    path = "/notebooks/{id}",
    tag = "notebooks",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "Notebook ID")
    ),
    request_body = UpdateNotebook,
    responses(
        (status = 200, description = "Notebook updated", body = Notebook),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Access denied"),
        (status = 404, description = "Notebook not found")
    )
)]
pub async fn update_notebook(
    State(state): State<AppState>,
    user: RequestUser,
    Path(id): Path<String>,
    WithRejection(Json(data), _): WithRejection<Json<UpdateNotebook>, AppError>,
) -> AppResult<Json<Notebook>> {
    let id = record_id("notebook", &id, "Notebook not found")?;
    let notebook = state.services.notebooks.update(user.id(), id, &data).await?;
    Ok(Json(notebook))
}

/// Delete a notebook and its edges
#[utoipa::path(
    delete,
    path = "/notebooks/{id}",
    tag = "notebooks",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "Notebook ID")
    ),
    responses(
        (status = 200, description = "Notebook deleted", body = MessageResponse),
        (status = 403, description = "Access denied"),
        (status = 404, description = "Notebook not found")
    )
)]
pub async fn delete_notebook(
    State(state): State<AppState>,
    user: RequestUser,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    let id = record_id("notebook", &id, "Notebook not found")?;
    state.services.notebooks.delete(user.id(), id).await?;
    Ok(Json(MessageResponse::new("Notebook deleted successfully")))
}

/// Link a source to a notebook
#[utoipa::path(
    post,
    path = "/notebooks/{id}/sources/{source_id}",
    tag = "notebooks",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "Notebook ID"),
        ("source_id" = String, Path, description = "Source ID")
    ),
    responses(
        (status = 200, description = "Source linked", body = MessageResponse),
        (status = 403, description = "Access denied to notebook or source"),
        (status = 404, description = "Notebook or source not found")
    )
)]
pub async fn add_source(
    State(state): State<AppState>,
    user: RequestUser,
    Path((id, source_id)): Path<(String, String)>,
) -> AppResult<Json<MessageResponse>> {
    let notebook_id = record_id("notebook", &id, "Notebook not found")?;
    state
        .services
        .notebooks
        .add_source(user.id(), notebook_id, parse_record_id("source", &source_id))
        .await?;
    Ok(Json(MessageResponse::new(
        "Source linked to notebook successfully",
    )))
}

/// Unlink a source from a notebook
#[utoipa::path(
    delete,
    path = "/notebooks/{id}/sources/{source_id}",
    tag = "notebooks",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "Notebook ID"),
        ("source_id" = String, Path, description = "Source ID")
    ),
    responses(
        (status = 200, description = "Source unlinked", body = MessageResponse),
        (status = 403, description = "Access denied"),
        (status = 404, description = "Notebook not found")
    )
)]
pub async fn remove_source(
    State(state): State<AppState>,
    user: RequestUser,
    Path((id, source_id)): Path<(String, String)>,
) -> AppResult<Json<MessageResponse>> {
    let notebook_id = record_id("notebook", &id, "Notebook not found")?;
    state
        .services
        .notebooks
        .remove_source(user.id(), notebook_id, parse_record_id("source", &source_id))
        .await?;
    Ok(Json(MessageResponse::new(
        "Source removed from notebook successfully",
    )))
}
