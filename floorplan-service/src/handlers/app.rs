use crate::startup::AppState;
use askama::Template;
use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;
use service_core::error::AppError;

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub max_upload_mb: usize,
}

pub async fn index(State(state): State<AppState>) -> impl IntoResponse {
    IndexTemplate {
        max_upload_mb: state.max_body_bytes / (1024 * 1024),
    }
}

/// Liveness plus whether a model credential is configured. Nothing about the
/// credential itself is exposed.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Local::now().to_rfc3339(),
        "gemini_configured": state.api_key_configured,
        "service": "floorplan-service",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

pub async fn endpoint_not_found() -> AppError {
    AppError::NotFound(anyhow::anyhow!("Endpoint not found"))
}
