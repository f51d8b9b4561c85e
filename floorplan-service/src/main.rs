use floorplan_service::config::FloorplanConfig;
use floorplan_service::services::providers::gemini::{GeminiConfig, GeminiTextProvider};
use floorplan_service::services::providers::TextProvider;
use floorplan_service::startup::Application;
use service_core::observability::init_tracing;
use std::sync::Arc;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let otlp_endpoint = std::env::var("OTLP_ENDPOINT").ok();
    init_tracing("floorplan-service", "info", otlp_endpoint.as_deref());

    let config = FloorplanConfig::load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        std::io::Error::other(format!("Configuration error: {}", e))
    })?;

    let Some(api_key) = config.gemini.api_key.clone() else {
        tracing::error!("GEMINI_API_KEY is not set; refusing to start");
        return Err(std::io::Error::other("GEMINI_API_KEY is not set"));
    };

    let gemini_config = GeminiConfig {
        api_key,
        model: config.gemini.model.clone(),
        timeout: config.gemini_timeout(),
    };
    let provider = GeminiTextProvider::new(gemini_config).map_err(|e| {
        tracing::error!("Failed to initialize Gemini provider: {}", e);
        std::io::Error::other(format!("Provider error: {}", e))
    })?;
    let text_provider: Arc<dyn TextProvider> = Arc::new(provider);

    tracing::info!(model = %config.gemini.model, "Initialized Gemini text provider");

    let app = Application::build(config, text_provider)
        .await
        .map_err(|e| std::io::Error::other(format!("Startup error: {}", e)))?;

    app.probe_model().await;

    app.run_until_stopped().await
}
