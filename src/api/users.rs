//! User administration endpoints

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{error::AppResult, models::UserResponse, AppState};

use super::{record_id, AuthenticatedUser};

/// Re-enable a user account (admin only)
#[utoipa::path(
    post,
    path = "/users/{id}/activate",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User activated", body = UserResponse),
        (status = 403, description = "Admin privileges required"),
        (status = 404, description = "User not found")
    )
)]
pub async fn activate_user(
    State(state): State<AppState>,
    AuthenticatedUser(admin): AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<Json<UserResponse>> {
    admin.require_admin()?;

    let id = record_id("user", &id, "User not found")?;
    let user = state.services.users.activate(id).await?;
    Ok(Json(UserResponse::from(user)))
}

/// Disable a user account (admin only)
///
/// Tokens already issued to the account stop working immediately.
#[utoipa::path(
    post,
    path = "/users/{id}/deactivate",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User deactivated", body = UserResponse),
        (status = 403, description = "Admin privileges required"),
        (status = 404, description = "User not found")
    )
)]
pub async fn deactivate_user(
    State(state): State<AppState>,
    AuthenticatedUser(admin): AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<Json<UserResponse>> {
    admin.require_admin()?;

    let id = record_id("user", &id, "User not found")?;
    let user = state.services.users.deactivate(id).await?;
    Ok(Json(UserResponse::from(user)))
}
