use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Whether the registry root is still a usable directory.
    pub registry_healthy: bool,
}

/// GET /health -- returns service and registry health.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let registry_healthy = match state.registry.health_check().await {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(error = %err, "Registry health check failed");
            false
        }
    };

    Json(HealthResponse {
        status: if registry_healthy { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        registry_healthy,
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
