//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::AppState;

/// Liveness document; `status` is "degraded" when the catalog cannot be read
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
    pub schema_version: Option<i32>,
}

/// GET /health
///
/// Does NOT require authentication.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let schema_version = match cinema_common::db::migrations::get_schema_version(&state.db).await {
        Ok(version) => Some(version),
        Err(e) => {
            tracing::warn!("Health check could not read schema version: {}", e);
            None
        }
    };

    Json(HealthResponse {
        status: if schema_version.is_some() { "ok" } else { "degraded" }.to_string(),
        module: "cinema-site".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        schema_version,
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
