//! Pipeline errors and their single mapping onto the HTTP error envelope.

use crate::services::providers::ProviderError;
use service_core::error::AppError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FloorplanError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("Invalid file type. Please upload an image.")]
    InvalidFileType(String),

    #[error("Could not read image: {0}")]
    ImageDecode(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("File not found")]
    NotFound(String),

    #[error("File too large. Maximum size is {}MB.", .0 / (1024 * 1024))]
    PayloadTooLarge(usize),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<FloorplanError> for AppError {
    fn from(err: FloorplanError) -> Self {
        match err {
            FloorplanError::InvalidInput(_)
            | FloorplanError::InvalidFileType(_)
            | FloorplanError::ImageDecode(_) => {
                tracing::warn!(error = %err, "Rejected request input");
                AppError::BadRequest(anyhow::anyhow!(err.to_string()))
            }
            FloorplanError::NotFound(name) => {
                tracing::warn!(filename = %name, "Requested file not found");
                AppError::NotFound(anyhow::anyhow!("File not found"))
            }
            FloorplanError::PayloadTooLarge(_) => {
                tracing::warn!(error = %err, "Request body over limit");
                AppError::PayloadTooLarge(err.to_string())
            }
            FloorplanError::Provider(ProviderError::Timeout(secs)) => {
                tracing::error!(timeout_secs = secs, "AI model call timed out");
                AppError::GatewayTimeout(format!(
                    "AI model did not respond within {} seconds",
                    secs
                ))
            }
            FloorplanError::Provider(e) => {
                tracing::error!(error = %e, "AI model call failed");
                AppError::BadGateway(e.to_string())
            }
            FloorplanError::Storage(e) => AppError::InternalError(anyhow::Error::new(e)),
            FloorplanError::Serialization(e) => AppError::InternalError(anyhow::Error::new(e)),
        }
    }
}
