//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, health, notebooks, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Open Notebook API",
        version = "0.1.0",
        description = "Authentication and notebook management REST API",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "/api", description = "API")
    ),
    paths(
        // Health
        health::health_check,
        // Auth
        auth::status,
        auth::register,
        auth::login,
        auth::me,
        auth::update_me,
        auth::change_password,
        // Users
        users::activate_user,
        users::deactivate_user,
        // Notebooks
        notebooks::list_notebooks,
        notebooks::create_notebook,
        notebooks::get_notebook,
        notebooks::update_notebook,
        notebooks::delete_notebook,
        notebooks::add_source,
        notebooks::remove_source,
    ),
    components(
        schemas(
            // Auth
            crate::models::user::AuthStatus,
            crate::models::user::RegisterRequest,
            crate::models::user::LoginRequest,
            crate::models::user::TokenResponse,
            crate::models::user::UpdateProfile,
            crate::models::user::ChangePassword,
            crate::models::user::UserResponse,
            // Notebooks
            crate::models::notebook::Notebook,
            crate::models::notebook::CreateNotebook,
            crate::models::notebook::UpdateNotebook,
            crate::models::MessageResponse,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "users", description = "User administration"),
        (name = "notebooks", description = "Notebook management and source linking")
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme referenced by secured paths
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
