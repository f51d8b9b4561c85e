//! Mock provider implementation for testing.

use super::{FinishReason, ImageAttachment, ProviderError, ProviderResponse, TextProvider};
use async_trait::async_trait;
use std::sync::Mutex;

/// What the mock does when called.
#[derive(Debug, Clone)]
pub enum MockBehavior {
    Respond(String),
    /// Succeeds at the transport level but returns no text.
    Empty,
    Fail(String),
    /// Never answers; used to exercise deadlines.
    Hang,
}

/// One observed call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub prompt: String,
    pub image_mime_type: Option<String>,
}

/// Mock text provider for testing.
pub struct MockTextProvider {
    behavior: MockBehavior,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockTextProvider {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn responding(text: impl Into<String>) -> Self {
        Self::new(MockBehavior::Respond(text.into()))
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self::new(MockBehavior::Fail(message.into()))
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|calls| calls.len()).unwrap_or_default()
    }
}

#[async_trait]
impl TextProvider for MockTextProvider {
    async fn generate(
        &self,
        prompt: &str,
        image: Option<&ImageAttachment>,
    ) -> Result<ProviderResponse, ProviderError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedCall {
                prompt: prompt.to_string(),
                image_mime_type: image.map(|i| i.mime_type.clone()),
            });
        }

        let text = match &self.behavior {
            MockBehavior::Respond(text) => Some(text.clone()),
            MockBehavior::Empty => None,
            MockBehavior::Fail(message) => return Err(ProviderError::ApiError(message.clone())),
            MockBehavior::Hang => {
                std::future::pending::<()>().await;
                None
            }
        };

        Ok(ProviderResponse {
            text,
            input_tokens: prompt.len() as i32 / 4,
            output_tokens: 10,
            finish_reason: FinishReason::Complete,
        })
    }

    fn name(&self) -> &str {
        "mock"
    }
}
