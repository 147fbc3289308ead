//! API handlers for Open Notebook REST endpoints

pub mod auth;
pub mod health;
pub mod middleware;
pub mod notebooks;
pub mod openapi;
pub mod users;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{parse_record_id, User},
    AppState,
};

/// User attached by the auth gate; `None` in single-user mode
pub struct RequestUser(pub Option<User>);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for RequestUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(RequestUser(parts.extensions.get::<User>().cloned()))
    }
}

impl RequestUser {
    pub fn id(&self) -> Option<Uuid> {
        self.0.as_ref().map(|user| user.id)
    }
}

/// Extractor for a request authenticated with a user token
pub struct AuthenticatedUser(pub User);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<User>()
            .cloned()
            .map(AuthenticatedUser)
            .ok_or_else(|| AppError::Authentication("Not authenticated".to_string()))
    }
}

/// Parse a path id, reporting unparseable ids as missing records
pub(crate) fn record_id(table: &str, raw: &str, not_found: &str) -> Result<Uuid, AppError> {
    parse_record_id(table, raw).ok_or_else(|| AppError::NotFound(not_found.to_string()))
}

/// Create the application router with all routes
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/health", get(health::health_check))
        // Authentication
        .route("/auth/status", get(auth::status))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me).put(auth::update_me))
        .route("/auth/change-password", post(auth::change_password))
        // User administration
        .route("/users/:id/activate", post(users::activate_user))
        .route("/users/:id/deactivate", post(users::deactivate_user))
        // Notebooks
        .route(
            "/notebooks",
            get(notebooks::list_notebooks).post(notebooks::create_notebook),
        )
        .route(
            "/notebooks/:id",
            get(notebooks::get_notebook)
                .put(notebooks::update_notebook)
                .delete(notebooks::delete_notebook),
        )
        .route(
            "/notebooks/:id/sources/:source_id",
            post(notebooks::add_source).delete(notebooks::remove_source),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ))
        .with_state(state);

    Router::new()
        .nest("/api", api)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header::AUTHORIZATION, Method, Request, Response},
        Router,
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::{
        config::AppConfig,
        models::User,
        repository::{
            health::MockHealthStore, notebooks::MockNotebooksStore, sources::MockSourcesStore,
            users::MockUsersStore, Repository,
        },
        services::users::tests::test_auth_config,
        AppState,
    };

    pub(crate) struct TestApp {
        pub users: MockUsersStore,
        pub notebooks: MockNotebooksStore,
        pub sources: MockSourcesStore,
        pub health: MockHealthStore,
        pub password: Option<String>,
    }

    impl TestApp {
        pub fn new() -> Self {
            let mut health = MockHealthStore::new();
            health.expect_ping().returning(|| Ok(()));
            Self {
                users: MockUsersStore::new(),
                notebooks: MockNotebooksStore::new(),
                sources: MockSourcesStore::new(),
                health,
                password: None,
            }
        }

        pub fn with_password(mut self, password: &str) -> Self {
            self.password = Some(password.to_string());
            self
        }

        /// Expect token lookups of `user` by id
        pub fn with_user(mut self, user: &User) -> Self {
            let user = user.clone();
            self.users
                .expect_get_by_id()
                .withf({
                    let id = user.id;
                    move |candidate| *candidate == id
                })
                .returning(move |_| Ok(Some(user.clone())));
            self
        }

        pub fn build(self) -> Router {
            let config = AppConfig {
                auth: crate::config::AuthConfig {
                    password: self.password,
                    ..test_auth_config()
                },
                ..AppConfig::default()
            };
            let repository = Repository::from_stores(
                Arc::new(self.users),
                Arc::new(self.notebooks),
                Arc::new(self.sources),
                Arc::new(self.health),
            );
            super::router(AppState::new(config, repository))
        }
    }

    pub(crate) fn token_for(user: &User) -> String {
        crate::services::tokens::TokenService::new(&test_auth_config())
            .create_access_token(&user.id.to_string(), &user.username)
            .unwrap()
    }

    pub(crate) async fn send(
        app: Router,
        method: Method,
        uri: &str,
        bearer: Option<&str>,
        body: Option<Value>,
    ) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(credentials) = bearer {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", credentials));
        }
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        app.oneshot(request).await.unwrap()
    }

    pub(crate) async fn json_body(response: Response<Body>) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }
}
