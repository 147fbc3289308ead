//! Health check endpoint

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::AppState;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// `healthy` or `unhealthy`
    pub status: &'static str,
    /// `connected` or `unavailable`
    pub database: &'static str,
    pub version: &'static str,
}

/// Liveness plus database connectivity
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service and database are up", body = HealthResponse),
        (status = 503, description = "Database is unreachable", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database_up = state.services.health.database_available().await;
    let (code, status, database) = if database_up {
        (StatusCode::OK, "healthy", "connected")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unhealthy", "unavailable")
    };

    (
        code,
        Json(HealthResponse {
            status,
            database,
            version: env!("CARGO_PKG_VERSION"),
        }),
    )
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};

    use crate::{
        api::test_support::{json_body, send, TestApp},
        error::AppError,
        repository::health::MockHealthStore,
    };

    #[tokio::test]
    async fn reports_connected_database() {
        let response = send(TestApp::new().build(), Method::GET, "/api/health", None, None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["database"], "connected");
    }

    #[tokio::test]
    async fn unreachable_database_is_service_unavailable() {
        let mut app = TestApp::new().with_password("s3cret");
        app.health = MockHealthStore::new();
        app.health
            .expect_ping()
            .returning(|| Err(AppError::Internal("pool timed out".to_string())));

        let response = send(app.build(), Method::GET, "/api/health", None, None).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = json_body(response).await;
        assert_eq!(body["status"], "unhealthy");
        assert_eq!(body["database"], "unavailable");
    }
}
