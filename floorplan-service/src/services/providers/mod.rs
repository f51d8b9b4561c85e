//! AI provider abstractions and implementations.
//!
//! This module provides a trait-based abstraction for the generative model,
//! allowing easy swapping between backends (Gemini, mock).

pub mod gemini;
pub mod mock;

use async_trait::async_trait;
use thiserror::Error;

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Rate limited by AI provider")]
    RateLimited,

    #[error("Content filtered by AI provider")]
    ContentFiltered,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("No response from AI model")]
    EmptyResponse,

    #[error("AI model timed out after {0}s")]
    Timeout(u64),
}

/// Image bytes handed to the model alongside a prompt.
#[derive(Debug, Clone)]
pub struct ImageAttachment {
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// Result of a provider response.
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    pub text: Option<String>,

    /// Input tokens consumed.
    pub input_tokens: i32,

    /// Output tokens generated.
    pub output_tokens: i32,

    pub finish_reason: FinishReason,
}

/// Reason why generation stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Complete,
    Length,
    ContentFilter,
}

/// Trait for text generation providers (e.g., Gemini).
#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Generate a text response, optionally grounded on one image.
    async fn generate(
        &self,
        prompt: &str,
        image: Option<&ImageAttachment>,
    ) -> Result<ProviderResponse, ProviderError>;

    /// Short provider name for logs.
    fn name(&self) -> &str;
}
