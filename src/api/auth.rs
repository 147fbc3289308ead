//! Authentication endpoints

use axum::{extract::State, Json};
use axum_extra::extract::WithRejection;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        user::{
            AuthStatus, ChangePassword, LoginRequest, RegisterRequest, TokenResponse,
            UpdateProfile, UserResponse,
        },
        MessageResponse,
    },
    AppState,
};

use super::AuthenticatedUser;

/// Report which authentication modes are enabled
#[utoipa::path(
    get,
    path = "/auth/status",
    tag = "auth",
    responses(
        (status = 200, description = "Authentication status", body = AuthStatus)
    )
)]
pub async fn status(State(state): State<AppState>) -> Json<AuthStatus> {
    let password_auth = state.config.auth.shared_password().is_some();
    let multiuser = state.services.users.multiuser_enabled().await;
    Json(AuthStatus::new(password_auth, multiuser))
}

/// Register a new user account
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "User registered", body = TokenResponse),
        (status = 400, description = "Invalid input or user already exists")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    WithRejection(Json(request), _): WithRejection<Json<RegisterRequest>, AppError>,
) -> AppResult<Json<TokenResponse>> {
    request.validate()?;
    let response = state.services.users.register(request).await?;
    Ok(Json(response))
}

/// Login with username (or email) and password
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = TokenResponse),
        (status = 401, description = "Invalid credentials or inactive account")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    WithRejection(Json(credentials), _): WithRejection<Json<LoginRequest>, AppError>,
) -> AppResult<Json<TokenResponse>> {
    let response = state
        .services
        .users
        .login(&credentials.username, &credentials.password)
        .await?;
    Ok(Json(response))
}

/// Get the current user's profile
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn me(AuthenticatedUser(user): AuthenticatedUser) -> Json<UserResponse> {
    Json(UserResponse::from(user))
}

/// Update the current user's profile
#[utoipa::path(
    put,
    path = "/auth/me",
    tag = "auth",
    security(("bearer_auth" = [])),
    request_body = UpdateProfile,
    responses(
        (status = 200, description = "Profile updated", body = UserResponse),
        (status = 400, description = "Invalid input or email already in use"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn update_me(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    WithRejection(Json(profile), _): WithRejection<Json<UpdateProfile>, AppError>,
) -> AppResult<Json<UserResponse>> {
    profile.validate()?;
    let updated = state.services.users.update_profile(&user, profile).await?;
    Ok(Json(UserResponse::from(updated)))
}

/// Change the current user's password
#[utoipa::path(
    post,
    path = "/auth/change-password",
    tag = "auth",
    security(("bearer_auth" = [])),
    request_body = ChangePassword,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "Current password is incorrect or new password too short"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn change_password(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    WithRejection(Json(request), _): WithRejection<Json<ChangePassword>, AppError>,
) -> AppResult<Json<MessageResponse>> {
    state.services.users.change_password(&user, request).await?;
    Ok(Json(MessageResponse::new("Password changed successfully")))
}
