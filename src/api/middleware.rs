//! Authentication gate for the API.
//!
//! Every request below `/api` passes through [`require_auth`]. A bearer
//! credential is first tried as a JWT issued by this server; when it is not
//! a valid token it is compared with the shared password configured for
//! single-user deployments. With neither a password nor an `Authorization`
//! header the request is let through without a user, which keeps
//! password-less single-user installs working.
//!
//! On success the resolved [`User`] (if any) is stored in the request
//! extensions, where the [`RequestUser`](super::RequestUser) and
//! [`AuthenticatedUser`](super::AuthenticatedUser) extractors pick it up.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap, Method},
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;

use crate::{
    error::{AppError, AppResult},
    models::{parse_record_id, User, UserClaims},
    AppState,
};

pub async fn require_auth(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let outcome = authorize(
        &state,
        request.method(),
        request.uri().path(),
        request.headers(),
    )
    .await;

    match outcome {
        Ok(user) => {
            if let Some(user) = user {
                request.extensions_mut().insert(user);
            }
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

async fn authorize(
    state: &AppState,
    method: &Method,
    path: &str,
    headers: &HeaderMap,
) -> AppResult<Option<User>> {
    let auth = &state.config.auth;

    if method == Method::OPTIONS || auth.public_paths.iter().any(|p| p == path) {
        return Ok(None);
    }

    let Some(header) = headers.get(AUTHORIZATION) else {
        return match auth.shared_password() {
            None => Ok(None),
            Some(_) => Err(AppError::Authentication(
                "Missing authorization header".to_string(),
            )),
        };
    };

    let credentials = header
        .to_str()
        .ok()
        .and_then(|value| value.split_once(' '))
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
        .map(|(_, credentials)| credentials)
        .ok_or_else(|| {
            AppError::Authentication("Invalid authorization header format".to_string())
        })?;

    if let Some(claims) = state.services.tokens.verify_token(credentials) {
        return resolve_user(state, &claims).await.map(Some);
    }

    if let Some(password) = auth.shared_password() {
        if bool::from(credentials.as_bytes().ct_eq(password.as_bytes())) {
            return Ok(None);
        }
    }

    Err(AppError::Authentication("Invalid credentials".to_string()))
}

/// Map a verified token to an active account
async fn resolve_user(state: &AppState, claims: &UserClaims) -> AppResult<User> {
    let Some(user_id) = parse_record_id("user", &claims.sub) else {
        tracing::warn!("JWT subject is not a user id: {}", claims.sub);
        return Err(AppError::Authentication("Invalid token".to_string()));
    };

    match state.services.users.get_by_id(user_id).await {
        Ok(Some(user)) if user.is_active => Ok(user),
        Ok(_) => Err(AppError::Authentication(
            "User account is inactive".to_string(),
        )),
        Err(e) => {
            tracing::warn!("Error validating user from JWT: {}", e);
            Err(AppError::Authentication("Invalid token".to_string()))
        }
    }
}
