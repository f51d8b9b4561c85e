mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::TestApp;
use floorplan_service::models::{AnalysisRecord, ImageInfo, PlanRecord, RecordKind};
use floorplan_service::services::providers::mock::MockTextProvider;
use serde_json::json;

fn analysis(timestamp: &str) -> AnalysisRecord {
    AnalysisRecord::new(
        timestamp.to_string(),
        format!("{}_plan.png", timestamp),
        ImageInfo::from_dimensions(800, 600).unwrap(),
        "Kitchen: 10x12 ft".to_string(),
    )
}

fn plan(timestamp: &str) -> PlanRecord {
    PlanRecord::new(
        timestamp.to_string(),
        "studio".to_string(),
        "Open plan".to_string(),
    )
}

#[tokio::test]
async fn history_lists_all_records_newest_first() {
    let app = TestApp::new(MockTextProvider::responding("unused")).await;
    let store = app.store();

    for ts in ["20240101_090000", "20240301_090000", "20240201_090000"] {
        store
            .save_record(RecordKind::Analysis, ts, &analysis(ts))
            .await
            .unwrap();
    }
    for ts in ["20240115_090000", "20240315_090000"] {
        store.save_record(RecordKind::Plan, ts, &plan(ts)).await.unwrap();
    }
    tokio::fs::write(app.output_dir().join("garbage.json"), b"not json")
        .await
        .unwrap();

    let (status, body) = app.get_json("/history").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let files = body["files"].as_array().unwrap();
    assert_eq!(files.len(), 5);

    let timestamps: Vec<&str> = files
        .iter()
        .map(|f| f["timestamp"].as_str().unwrap())
        .collect();
    assert_eq!(
        timestamps,
        [
            "20240315_090000",
            "20240301_090000",
            "20240201_090000",
            "20240115_090000",
            "20240101_090000"
        ]
    );

    for file in files {
        let filename = file["filename"].as_str().unwrap();
        let expected = if filename.starts_with("analysis_") {
            "analysis"
        } else {
            "plan"
        };
        assert_eq!(file["kind"], expected);
    }

    app.cleanup().await;
}

#[tokio::test]
async fn legacy_records_are_classified_by_content() {
    let app = TestApp::new(MockTextProvider::responding("unused")).await;

    tokio::fs::write(
        app.output_dir().join("analysis_20230101_000000.json"),
        serde_json::to_vec_pretty(&json!({
            "timestamp": "20230101_000000",
            "analysis": "old analysis",
            "success": true
        }))
        .unwrap(),
    )
    .await
    .unwrap();
    tokio::fs::write(
        app.output_dir().join("plan_20230102_000000.json"),
        serde_json::to_vec_pretty(&json!({
            "timestamp": "20230102_000000",
            "requirements": "cabin",
            "generated_plan": "old plan",
            "success": true
        }))
        .unwrap(),
    )
    .await
    .unwrap();

    let (_, body) = app.get_json("/history").await;
    let files = body["files"].as_array().unwrap();

    assert_eq!(files[0]["kind"], "plan");
    assert_eq!(files[1]["kind"], "analysis");

    app.cleanup().await;
}

#[tokio::test]
async fn empty_history_is_successful() {
    let app = TestApp::new(MockTextProvider::responding("unused")).await;

    let (status, body) = app.get_json("/history").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "files": [], "success": true }));

    app.cleanup().await;
}

#[tokio::test]
async fn download_returns_exact_record_bytes() {
    let app = TestApp::new(MockTextProvider::responding("unused")).await;
    let record = plan("20240101_120000");

    let filename = app
        .store()
        .save_record(RecordKind::Plan, &record.timestamp, &record)
        .await
        .unwrap();
    let on_disk = tokio::fs::read(app.output_dir().join(&filename))
        .await
        .unwrap();

    let response = tower::ServiceExt::oneshot(
        app.router.clone(),
        Request::builder()
            .uri(format!("/download/{}", filename))
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "application/json");
    assert!(response.headers()["content-disposition"]
        .to_str()
        .unwrap()
        .starts_with("attachment"));

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(body.to_vec(), on_disk);

    app.cleanup().await;
}

#[tokio::test]
async fn download_of_analysis_after_pipeline_round_trips() {
    let app = TestApp::new(MockTextProvider::responding("ROOM: 100sqft")).await;

    let (_, analyzed) = app
        .post_image("image", "plan.png", &common::png_bytes(10, 10))
        .await;
    let filename = format!("analysis_{}.json", analyzed["timestamp"].as_str().unwrap());

    let (status, downloaded) = app.get_json(&format!("/download/{}", filename)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(downloaded, analyzed);

    app.cleanup().await;
}

#[tokio::test]
async fn download_rejects_path_traversal() {
    let app = TestApp::new(MockTextProvider::responding("unused")).await;
    tokio::fs::write(app.root.join("secret.json"), b"{\"secret\":true}")
        .await
        .unwrap();

    for uri in [
        "/download/..%2Fsecret.json",
        "/download/..%2F..%2Fetc%2Fpasswd",
        "/download/%2E%2E",
        "/download/../secret.json",
        "/download/..%5Csecret.json",
        "/download/missing.json",
    ] {
        let (status, body) = app.get_json(uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{} escaped", uri);
        assert_eq!(body["success"], false);
    }

    app.cleanup().await;
}
