//! Application startup and lifecycle management.

use crate::config::FloorplanConfig;
use crate::handlers;
use crate::services::providers::TextProvider;
use crate::services::{ModelGateway, RecordStore};
use axum::{
    body::Body,
    extract::DefaultBodyLimit,
    http::Request,
    middleware::from_fn,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{request_id_middleware, tracing::make_request_span};
use std::any::Any;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub store: RecordStore,
    pub gateway: ModelGateway,
    pub api_key_configured: bool,
    pub max_body_bytes: usize,
}

impl AppState {
    pub async fn new(
        config: &FloorplanConfig,
        provider: Arc<dyn TextProvider>,
    ) -> Result<Self, AppError> {
        let store = RecordStore::new(&config.storage.upload_dir, &config.storage.output_dir)
            .await
            .map_err(|e| {
                tracing::error!(
                    upload_dir = %config.storage.upload_dir.display(),
                    output_dir = %config.storage.output_dir.display(),
                    "Failed to initialize storage directories: {}",
                    e
                );
                AppError::from(e)
            })?;

        Ok(Self {
            store,
            gateway: ModelGateway::new(provider, config.gemini_timeout()),
            api_key_configured: config.api_key_configured(),
            max_body_bytes: config.limits.max_body_bytes,
        })
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health_check))
        .route("/analyze", post(handlers::analyze_floorplan))
        .route("/generate_plan", post(handlers::generate_plan))
        .route("/test_api", get(handlers::test_api))
        .route("/history", get(handlers::list_history))
        .route("/download/:filename", get(handlers::download_record))
        .fallback(handlers::endpoint_not_found)
        .layer(DefaultBodyLimit::max(state.max_body_bytes))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            make_request_span(request)
        }))
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

pub(crate) fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    AppError::InternalError(anyhow::anyhow!("handler panicked: {}", detail)).into_response()
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the given configuration and model provider.
    pub async fn build(
        config: FloorplanConfig,
        provider: Arc<dyn TextProvider>,
    ) -> Result<Self, AppError> {
        let state = AppState::new(&config, provider).await?;

        // Port 0 = random port for testing
        let addr = config.common.bind_address();
        let listener = TcpListener::bind(&addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(
            port,
            upload_dir = %config.storage.upload_dir.display(),
            output_dir = %config.storage.output_dir.display(),
            model = %config.gemini.model,
            "Floor-plan service listening"
        );

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// One connectivity round trip to the model. The outcome is logged only.
    pub async fn probe_model(&self) {
        match self.state.gateway.probe_connectivity().await {
            Ok(_) => tracing::info!("AI model connection test successful"),
            Err(e) => tracing::warn!(error = %e, "AI model connection test failed"),
        }
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let router = build_router(self.state);
        axum::serve(self.listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
