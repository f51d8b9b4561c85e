use crate::error::FloorplanError;
use crate::models::{sort_newest_first, HistoryEntry};
use crate::startup::AppState;
use axum::{
    extract::{rejection::PathRejection, Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use service_core::error::AppError;

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub files: Vec<HistoryEntry>,
    pub success: bool,
}

pub async fn list_history(State(state): State<AppState>) -> Result<Json<HistoryResponse>, AppError> {
    let mut files = state.store.list_records().await?;
    sort_newest_first(&mut files);

    tracing::debug!(count = files.len(), "History listed");

    Ok(Json(HistoryResponse {
        files,
        success: true,
    }))
}

pub async fn download_record(
    State(state): State<AppState>,
    filename: Result<Path<String>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path(filename) =
        filename.map_err(|e| FloorplanError::NotFound(e.body_text()))?;

    let bytes = state.store.read_record_file(&filename).await?;

    let content_type = if filename.ends_with(".json") {
        "application/json"
    } else {
        "application/octet-stream"
    };
    let disposition = format!("attachment; filename=\"{}\"", filename.replace('"', "_"));

    tracing::info!(filename = %filename, size = bytes.len(), "Record download");

    Ok((
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}
