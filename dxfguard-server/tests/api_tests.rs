//! HTTP API integration tests

use std::path::Path;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use dxfguard_server::{router, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;

fn app(dir: &Path) -> Router {
    router(AppState::new(dir))
}

fn sample_bytes(dir: &Path) -> Vec<u8> {
    let path = dir.join("source.dxf");
    dxfguard::sample::write_sample(&path).unwrap();
    std::fs::read(path).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, value: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(value.to_string()))
        .unwrap()
}

async fn upload(app: &Router, filename: &str, bytes: Vec<u8>) -> Response {
    let request = Request::post(format!("/api/analyze?filename={}", filename))
        .body(Body::from(bytes))
        .unwrap();
    send(app, request).await
}

/// Upload and wait for the analysis job to leave `processing`.
async fn analyzed(app: &Router, bytes: Vec<u8>) -> (String, Value) {
    let response = upload(app, "part.dxf", bytes).await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let id = body_json(response).await["job_id"].as_str().unwrap().to_string();

    for _ in 0..200 {
        let job = body_json(send(app, get(&format!("/api/status/{}", id))).await).await;
        if job["status"] != "processing" {
            return (id, job);
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    panic!("analysis job {} never finished", id);
}

#[tokio::test]
async fn test_health() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path());

    let response = send(&app, get("/api/health")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let value = body_json(response).await;
    assert_eq!(value["status"], "healthy");
    assert_eq!(value["active_jobs"], 0);
}

#[tokio::test]
async fn test_root_lists_endpoints() {
    let dir = tempfile::tempdir().unwrap();
    let value = body_json(send(&app(dir.path()), get("/")).await).await;
    assert_eq!(value["endpoints"]["analyze"], "/api/analyze");
}

#[tokio::test]
async fn test_analyze_job_completes() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path());

    let (_, job) = analyzed(&app, sample_bytes(dir.path())).await;
    assert_eq!(job["status"], "completed");
    assert_eq!(job["filename"], "part.dxf");
    assert_eq!(job["result"]["drawing"]["summary_info"]["total_entities"], 17);
    assert!(job["result"]["advanced"]["summary"]["quality_score"].is_number());

    let health = body_json(send(&app, get("/api/health")).await).await;
    assert_eq!(health["active_jobs"], 1);
}

#[tokio::test]
async fn test_analyze_rejects_non_dxf() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path());

    let response = upload(&app, "notes.txt", b"hello".to_vec()).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["detail"], "Only DXF files are supported");
}

#[tokio::test]
async fn test_analyze_garbage_fails_job() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path());

    let (_, job) = analyzed(&app, b"this is not a drawing".to_vec()).await;
    assert_eq!(job["status"], "failed");
    assert!(job["error"].is_string());
    assert!(job["result"].is_null());
}

#[tokio::test]
async fn test_unknown_job_is_404() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path());
    let id = uuid::Uuid::new_v4();

    for uri in [format!("/api/status/{}", id), format!("/api/download/{}", id)] {
        let response = send(&app, get(&uri)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["detail"], "Job not found");
    }
}

#[tokio::test]
async fn test_download_json_and_markdown() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path());
    let (id, _) = analyzed(&app, sample_bytes(dir.path())).await;

    let value = body_json(send(&app, get(&format!("/api/download/{}", id))).await).await;
    assert_eq!(value["drawing"]["summary_info"]["total_entities"], 17);

    let response = send(&app, get(&format!("/api/download/{}?format=markdown", id))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/markdown; charset=utf-8"
    );
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let markdown = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(markdown.contains("# CAD Drawing Analysis Report"));
    assert!(markdown.contains("# Advanced DXF Analysis"));

    let response = send(&app, get(&format!("/api/download/{}?format=dxf", id))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_compare_two_uploads() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path());
    let (first, _) = analyzed(&app, sample_bytes(dir.path())).await;
    let (second, _) = analyzed(&app, sample_bytes(dir.path())).await;

    let response = send(
        &app,
        post_json("/api/compare", json!({"file1_id": first, "file2_id": second})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let value = body_json(response).await;
    assert_eq!(value["status"], "completed");
    assert!(value["differences"]["entity_changes"].as_array().unwrap().is_empty());
    assert!(value["report"].as_str().unwrap().contains('#'));
}

#[tokio::test]
async fn test_compare_unknown_upload() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path());
    let (first, _) = analyzed(&app, sample_bytes(dir.path())).await;

    let response = send(
        &app,
        post_json(
            "/api/compare",
            json!({"file1_id": first, "file2_id": uuid::Uuid::new_v4()}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_autofix_then_download_and_cleanup() {
    let dir = tempfile::tempdir().unwrap();
    let uploads = dir.path().join("uploads");
    std::fs::create_dir(&uploads).unwrap();
    let app = app(&uploads);
    let (source, _) = analyzed(&app, sample_bytes(dir.path())).await;

    let response = send(&app, post_json("/api/autofix", json!({"file_id": source}))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let value = body_json(response).await;
    assert_eq!(value["status"], "completed");
    assert_eq!(value["result"]["summary"]["backup_created"], true);
    let fixed = value["job_id"].as_str().unwrap().to_string();

    let response = send(&app, get(&format!("/api/download/{}?format=dxf", fixed))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/dxf");
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let round_trip = uploads.join("round_trip.dxf");
    std::fs::write(&round_trip, &bytes).unwrap();
    assert!(dxfguard::parse_drawing(&round_trip).is_ok());
    std::fs::remove_file(&round_trip).unwrap();

    // upload, backup, fixed drawing
    assert_eq!(std::fs::read_dir(&uploads).unwrap().count(), 3);

    let request = Request::delete(format!("/api/cleanup/{}", source))
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&app, request).await.status(), StatusCode::OK);
    assert_eq!(std::fs::read_dir(&uploads).unwrap().count(), 1);

    let response = send(&app, get(&format!("/api/status/{}", source))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let request = Request::delete(format!("/api/cleanup/{}", source))
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&app, request).await.status(), StatusCode::NOT_FOUND);
}
