#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use floorplan_service::config::{FloorplanConfig, GeminiSettings, LimitsConfig, StorageConfig};
use floorplan_service::services::providers::mock::MockTextProvider;
use floorplan_service::services::RecordStore;
use floorplan_service::startup::{build_router, AppState, Application};
use image::{ImageFormat, RgbImage};
use secrecy::Secret;
use service_core::config::Config as CoreConfig;
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_API_KEY: &str = "test-api-key";
pub const BOUNDARY: &str = "floorplan-test-boundary";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub provider: Arc<MockTextProvider>,
    pub root: PathBuf,
}

pub fn test_config(root: &std::path::Path, api_key: Option<&str>) -> FloorplanConfig {
    FloorplanConfig {
        common: CoreConfig {
            host: "127.0.0.1".to_string(),
            port: 0, // Random port for testing
        },
        gemini: GeminiSettings {
            api_key: api_key.map(|k| Secret::new(k.to_string())),
            model: "gemini-2.0-flash".to_string(),
            timeout_secs: 1,
        },
        storage: StorageConfig {
            upload_dir: root.join("uploads"),
            output_dir: root.join("outputs"),
        },
        limits: LimitsConfig {
            max_body_bytes: 16 * 1024 * 1024,
        },
    }
}

fn test_root() -> PathBuf {
    std::env::temp_dir().join(format!("floorplan-test-{}", Uuid::new_v4()))
}

impl TestApp {
    pub async fn new(provider: MockTextProvider) -> Self {
        let root = test_root();
        Self::with_config(provider, test_config(&root, Some(TEST_API_KEY)), root).await
    }

    pub async fn with_config(
        provider: MockTextProvider,
        config: FloorplanConfig,
        root: PathBuf,
    ) -> Self {
        let provider = Arc::new(provider);
        let state = AppState::new(&config, provider.clone())
            .await
            .expect("Failed to build application state");
        let router = build_router(state.clone());

        TestApp {
            router,
            state,
            provider,
            root,
        }
    }

    pub async fn without_api_key(provider: MockTextProvider) -> Self {
        let root = test_root();
        Self::with_config(provider, test_config(&root, None), root).await
    }

    pub async fn with_body_limit(provider: MockTextProvider, max_body_bytes: usize) -> Self {
        let root = test_root();
        let mut config = test_config(&root, Some(TEST_API_KEY));
        config.limits.max_body_bytes = max_body_bytes;
        Self::with_config(provider, config, root).await
    }

    pub fn store(&self) -> &RecordStore {
        &self.state.store
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root.join("outputs")
    }

    pub fn upload_dir(&self) -> PathBuf {
        self.root.join("uploads")
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to execute request");
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");
        (status, body.to_vec())
    }

    pub async fn send_json(&self, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let (status, body) = self.send(request).await;
        let json = serde_json::from_slice(&body).expect("Failed to parse JSON");
        (status, json)
    }

    pub async fn get_json(&self, uri: &str) -> (StatusCode, serde_json::Value) {
        self.send_json(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post_json(
        &self,
        uri: &str,
        payload: &serde_json::Value,
    ) -> (StatusCode, serde_json::Value) {
        self.send_json(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn post_image(
        &self,
        field: &str,
        filename: &str,
        bytes: &[u8],
    ) -> (StatusCode, serde_json::Value) {
        self.send_json(multipart_request("/analyze", field, filename, bytes))
            .await
    }

    pub async fn output_files(&self) -> Vec<String> {
        list_dir(&self.output_dir()).await
    }

    pub async fn upload_files(&self) -> Vec<String> {
        list_dir(&self.upload_dir()).await
    }

    /// Cleanup test resources.
    pub async fn cleanup(&self) {
        let _ = tokio::fs::remove_dir_all(&self.root).await;
    }
}

/// A server bound to a random local port, for tests that go over the wire.
pub struct SpawnedApp {
    pub address: String,
    pub provider: Arc<MockTextProvider>,
    pub root: PathBuf,
}

impl SpawnedApp {
    pub async fn spawn(provider: MockTextProvider) -> Self {
        let root = test_root();
        let provider = Arc::new(provider);
        let config = test_config(&root, Some(TEST_API_KEY));

        let app = Application::build(config, provider.clone())
            .await
            .expect("Failed to build test application");
        let address = format!("http://127.0.0.1:{}", app.port());

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for HTTP server to be ready by polling health endpoint
        let client = reqwest::Client::new();
        for _ in 0..50 {
            if client.get(format!("{}/health", address)).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        SpawnedApp {
            address,
            provider,
            root,
        }
    }

    pub async fn cleanup(&self) {
        let _ = tokio::fs::remove_dir_all(&self.root).await;
    }
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    RgbImage::new(width, height)
        .write_to(&mut out, ImageFormat::Png)
        .expect("Failed to encode PNG");
    out.into_inner()
}

pub fn multipart_request(uri: &str, field: &str, filename: &str, bytes: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn list_dir(dir: &std::path::Path) -> Vec<String> {
    let mut names = Vec::new();
    if let Ok(mut entries) = tokio::fs::read_dir(dir).await {
        while let Ok(Some(entry)) = entries.next_entry().await {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
    }
    names.sort();
    names
}
