//! The model gateway: the only place prompts are written and the only path to
//! the external AI provider.

use crate::services::imaging::DecodedImage;
use crate::services::providers::{ImageAttachment, ProviderError, TextProvider};
use std::sync::Arc;
use std::time::Duration;

const ANALYSIS_PROMPT: &str = "\
You are an expert architect and floor plan analyzer. Analyze this floor plan image and provide:

1. **DIMENSIONS ANALYSIS:**
   - Estimate the total floor area in square feet
   - Identify the approximate length and width of the property
   - Calculate room dimensions where visible

2. **SPACE IDENTIFICATION:**
   - List all identifiable rooms and spaces
   - Estimate the size of each room in square feet
   - Identify doors, windows, and openings

3. **OPTIMAL LAYOUT RECOMMENDATIONS:**
   - Suggest improvements for space utilization
   - Recommend furniture placement for each room
   - Identify potential traffic flow issues
   - Suggest lighting and ventilation considerations

4. **MEASUREMENTS & SPECIFICATIONS:**
   - Provide specific measurements in feet and inches
   - Calculate total usable space vs. circulation space
   - Identify any structural elements (walls, columns, etc.)

5. **DESIGN SUGGESTIONS:**
   - Recommend color schemes for different areas
   - Suggest materials for flooring in different rooms
   - Provide storage solutions for each space

Please format your response in clear sections with bullet points and specific measurements where possible.";

const PROBE_PROMPT: &str = "Say 'Hello, Gemini API is working!'";

fn plan_prompt(requirements: &str) -> String {
    format!(
        "Based on these requirements: \"{requirements}\"

Generate a detailed floor plan with:
1. Room layout and dimensions
2. Door and window placements
3. Furniture arrangement suggestions
4. Traffic flow optimization
5. Lighting and electrical recommendations
6. Plumbing considerations
7. Storage solutions

Provide specific measurements and practical implementation details."
    )
}

#[derive(Clone)]
pub struct ModelGateway {
    provider: Arc<dyn TextProvider>,
    timeout: Duration,
}

impl ModelGateway {
    pub fn new(provider: Arc<dyn TextProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    pub async fn analyze_image(&self, image: &DecodedImage) -> Result<String, ProviderError> {
        self.complete(ANALYSIS_PROMPT, Some(&image.attachment)).await
    }

    pub async fn generate_plan(&self, requirements: &str) -> Result<String, ProviderError> {
        self.complete(&plan_prompt(requirements), None).await
    }

    /// Cheap round trip used at startup and by `/test_api`. Callers report the
    /// outcome; nothing here is fatal.
    pub async fn probe_connectivity(&self) -> Result<String, ProviderError> {
        self.complete(PROBE_PROMPT, None).await
    }

    async fn complete(
        &self,
        prompt: &str,
        image: Option<&ImageAttachment>,
    ) -> Result<String, ProviderError> {
        let started = std::time::Instant::now();

        let response = tokio::time::timeout(self.timeout, self.provider.generate(prompt, image))
            .await
            .map_err(|_| ProviderError::Timeout(self.timeout.as_secs()))??;

        tracing::info!(
            provider = self.provider.name(),
            prompt_len = prompt.len(),
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            finish_reason = ?response.finish_reason,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Received response from AI model"
        );

        match response.text {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(ProviderError::EmptyResponse),
        }
    }
}
