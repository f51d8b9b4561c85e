use crate::error::FloorplanError;
use crate::models::{AnalysisRecord, PlanRecord, RecordKind};
use crate::services::{imaging, storage};
use crate::startup::AppState;
use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::JsonRejection,
        Multipart, State,
    },
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use service_core::error::AppError;
use validator::Validate;

/// Multipart field carrying the floor-plan image.
const IMAGE_FIELD: &str = "image";

#[derive(Debug, Deserialize, Validate)]
pub struct PlanRequest {
    #[serde(default)]
    #[validate(length(max = 20000, message = "Requirements must be at most 20000 characters"))]
    pub requirements: String,
}

struct ImageUpload {
    filename: String,
    bytes: Vec<u8>,
}

pub async fn analyze_floorplan(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AnalysisRecord>, AppError> {
    tracing::info!("Received image analysis request");

    let multipart = multipart
        .map_err(|_| FloorplanError::InvalidInput("No image uploaded".to_string()))?;
    let upload = read_image_field(&state, multipart).await?;
    let record = run_analysis(&state, upload).await?;

    Ok(Json(record))
}

async fn read_image_field(
    state: &AppState,
    mut multipart: Multipart,
) -> Result<ImageUpload, FloorplanError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(state, e))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        if filename.trim().is_empty() {
            return Err(FloorplanError::InvalidInput("No file selected".to_string()));
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| multipart_error(state, e))?
            .to_vec();

        return Ok(ImageUpload { filename, bytes });
    }

    Err(FloorplanError::InvalidInput("No image uploaded".to_string()))
}

fn multipart_error(state: &AppState, err: MultipartError) -> FloorplanError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        FloorplanError::PayloadTooLarge(state.max_body_bytes)
    } else {
        FloorplanError::InvalidInput(format!("Failed to read upload: {}", err.body_text()))
    }
}

async fn run_analysis(
    state: &AppState,
    upload: ImageUpload,
) -> Result<AnalysisRecord, FloorplanError> {
    let stored = state
        .store
        .save_upload(&upload.bytes, &upload.filename)
        .await?;

    let decoded = imaging::decode(upload.bytes)?;
    tracing::info!(
        filename = %stored.filename,
        width = decoded.info.width,
        height = decoded.info.height,
        "Image decoded"
    );

    let analysis = state.gateway.analyze_image(&decoded).await?;

    let record = AnalysisRecord::new(
        stored.timestamp.clone(),
        stored.filename,
        decoded.info,
        analysis,
    );
    state
        .store
        .save_record(RecordKind::Analysis, &record.timestamp, &record)
        .await?;

    Ok(record)
}

pub async fn generate_plan(
    State(state): State<AppState>,
    payload: Result<Json<PlanRequest>, JsonRejection>,
) -> Result<Json<PlanRecord>, AppError> {
    tracing::info!("Received plan generation request");

    let Json(request) = payload.map_err(|rejection| json_error(&state, rejection))?;

    if request.requirements.trim().is_empty() {
        return Err(FloorplanError::InvalidInput("No requirements provided".to_string()).into());
    }
    request.validate()?;

    let record = run_plan(&state, request.requirements).await?;
    Ok(Json(record))
}

fn json_error(state: &AppState, rejection: JsonRejection) -> FloorplanError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        FloorplanError::PayloadTooLarge(state.max_body_bytes)
    } else {
        FloorplanError::InvalidInput(rejection.body_text())
    }
}

async fn run_plan(state: &AppState, requirements: String) -> Result<PlanRecord, FloorplanError> {
    let generated_plan = state.gateway.generate_plan(&requirements).await?;

    let record = PlanRecord::new(storage::generate_timestamp(), requirements, generated_plan);
    state
        .store
        .save_record(RecordKind::Plan, &record.timestamp, &record)
        .await?;

    Ok(record)
}

/// Round trip to the model. Always answers 200; failures are reported in the
/// body.
pub async fn test_api(State(state): State<AppState>) -> Json<Value> {
    match state.gateway.probe_connectivity().await {
        Ok(response) => Json(json!({
            "success": true,
            "message": "API connection successful",
            "response": response,
            "api_key_configured": state.api_key_configured
        })),
        Err(e) => {
            tracing::warn!(error = %e, "AI connectivity test failed");
            Json(json!({
                "success": false,
                "error": e.to_string(),
                "api_key_configured": state.api_key_configured
            }))
        }
    }
}
