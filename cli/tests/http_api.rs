use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use streamcast_cli::http::{create_router, AppState};
use streamcast_core::api::{
    AppConfig, FfmpegRunnerPlugin, StreamController, MISSING_INPUT_MESSAGE, RUN_ENDED_MESSAGE,
};
use tokio::sync::broadcast;
use tower::ServiceExt;

const BOUNDARY: &str = "streamcast-test-boundary";

fn router_for(media: &Path, tweak: impl FnOnce(&mut AppConfig)) -> Router {
    let mut cfg = AppConfig::default();
    cfg.encoder.bin = "streamcast-test-encoder-that-does-not-exist".into();
    tweak(&mut cfg);
    let controller = StreamController::new(
        &cfg,
        media.to_path_buf(),
        Arc::new(FfmpegRunnerPlugin::new()),
    );
    let (shutdown_tx, _) = broadcast::channel(1);
    create_router(AppState::new(
        "test-session".into(),
        controller,
        cfg,
        shutdown_tx,
    ))
}

async fn send(router: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = router.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn upload(file_name: &str, data: &[u8]) -> Request<Body> {
    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri("/api/v1/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn line_texts(body: &Value) -> Vec<String> {
    body["lines"]
        .as_array()
        .map(|lines| {
            lines
                .iter()
                .filter_map(|l| l["text"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

#[tokio::test]
async fn index_page_is_served() {
    let media = tempfile::tempdir().unwrap();
    let router = router_for(media.path(), |_| {});

    let resp = router.oneshot(get("/")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let html = String::from_utf8_lossy(&bytes);
    assert!(html.contains("stream key"));
    assert!(html.contains("/api/v1/streams"));
}

#[tokio::test]
async fn health_reports_idle() {
    let media = tempfile::tempdir().unwrap();
    let router = router_for(media.path(), |_| {});

    let (status, body) = send(&router, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["session_id"], "test-session");
    assert_eq!(body["state"], "idle");
}

#[tokio::test]
async fn videos_lists_media_directory() {
    let media = tempfile::tempdir().unwrap();
    for name in ["b.mov", "a.mp4", "readme.txt"] {
        std::fs::write(media.path().join(name), b"x").unwrap();
    }
    let router = router_for(media.path(), |_| {});

    let (status, body) = send(&router, get("/api/v1/videos")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["videos"], json!(["a.mp4", "b.mov"]));
}

#[tokio::test]
async fn upload_saves_and_overwrites() {
    let media = tempfile::tempdir().unwrap();
    let router = router_for(media.path(), |_| {});

    let (status, body) = send(&router, upload("../clip.mp4", b"first")).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["file_name"], "clip.mp4");
    assert_eq!(body["bytes"], 5);

    let (status, _) = send(&router, upload("clip.mp4", b"second!")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        std::fs::read(media.path().join("clip.mp4")).unwrap(),
        b"second!"
    );

    let (_, body) = send(&router, get("/api/v1/videos")).await;
    assert_eq!(body["videos"], json!(["clip.mp4"]));
}

#[tokio::test]
async fn upload_rejects_non_video() {
    let media = tempfile::tempdir().unwrap();
    let router = router_for(media.path(), |_| {});

    let (status, body) = send(&router, upload("notes.txt", b"hello")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "INVALID_UPLOAD");
    assert!(!media.path().join("notes.txt").exists());
}

#[tokio::test]
async fn upload_over_limit_is_rejected() {
    let media = tempfile::tempdir().unwrap();
    let router = router_for(media.path(), |cfg| cfg.server.max_upload_size_mb = 1);

    let data = vec![0u8; 2 * 1024 * 1024];
    let (status, body) = send(&router, upload("big.mp4", &data)).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE, "{body}");
    assert!(!media.path().join("big.mp4").exists());
}

#[tokio::test]
async fn start_without_key_is_refused() {
    let media = tempfile::tempdir().unwrap();
    std::fs::write(media.path().join("v.mp4"), b"x").unwrap();
    let router = router_for(media.path(), |_| {});

    let (status, body) = send(
        &router,
        post_json("/api/v1/streams", json!({"source": "v.mp4", "stream_key": "  "})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], MISSING_INPUT_MESSAGE);
    assert_eq!(body["error_code"], "MISSING_INPUT");

    let (_, body) = send(&router, get("/api/v1/streams")).await;
    assert_eq!(body["runs"], json!([]));
}

#[tokio::test]
async fn start_with_unknown_source_is_not_found() {
    let media = tempfile::tempdir().unwrap();
    let router = router_for(media.path(), |_| {});

    let (status, body) = send(
        &router,
        post_json(
            "/api/v1/streams",
            json!({"source": "missing.mp4", "stream_key": "abcd"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error_code"], "SOURCE_NOT_FOUND");
}

#[tokio::test]
async fn failed_launch_shows_error_then_final_line() {
    let media = tempfile::tempdir().unwrap();
    std::fs::write(media.path().join("v.mp4"), b"x").unwrap();
    let router = router_for(media.path(), |_| {});

    let (status, body) = send(
        &router,
        post_json(
            "/api/v1/streams",
            json!({"source": "v.mp4", "stream_key": "secret-key", "vertical": true}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let run_id = body["run_id"].as_str().unwrap().to_string();

    let mut log = Value::Null;
    for _ in 0..100 {
        let (_, body) = send(&router, get(&format!("/api/v1/streams/{run_id}/log"))).await;
        if body["phase"] != "running" {
            log = body;
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert_eq!(log["phase"], "failed");

    let lines = line_texts(&log);
    assert!(lines[0].starts_with("Running: "));
    assert!(lines[0].contains("scale=720:1280"));
    assert!(!lines[0].contains("secret-key"));
    assert!(lines.iter().any(|l| l.starts_with("Error: ")));
    assert_eq!(lines.last().map(String::as_str), Some(RUN_ENDED_MESSAGE));

    let last_seq = log["last_seq"].as_u64().unwrap();
    let (_, body) = send(
        &router,
        get(&format!("/api/v1/streams/{run_id}/log?since={last_seq}")),
    )
    .await;
    assert!(line_texts(&body).is_empty());

    let (status, body) = send(&router, get(&format!("/api/v1/streams/{run_id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["run"]["source"], "v.mp4");
    assert_eq!(body["run"]["vertical"], true);
}

#[tokio::test]
async fn stop_all_with_nothing_running() {
    let media = tempfile::tempdir().unwrap();
    let router = router_for(media.path(), |_| {});

    let (status, body) = send(&router, post_json("/api/v1/streams/stop", json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stopped"], 0);
}

#[tokio::test]
async fn unknown_and_malformed_run_ids() {
    let media = tempfile::tempdir().unwrap();
    let router = router_for(media.path(), |_| {});

    let (status, body) = send(
        &router,
        get("/api/v1/streams/6f1c2a9e-2b7d-4f3e-9a51-0c8d7e6b5a41/log"),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error_code"], "NOT_FOUND");

    let (status, _) = send(
        &router,
        post_json("/api/v1/streams/not_a_run!/stop", json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn health_reports_request_and_error_counts() {
    let media = tempfile::tempdir().unwrap();
    let router = router_for(media.path(), |_| {});

    send(&router, get("/api/v1/videos")).await;
    send(&router, post_json("/api/v1/streams", json!({}))).await;

    let (_, body) = send(&router, get("/health")).await;
    assert_eq!(body["requests_by_endpoint"]["/api/v1/videos"], 1);
    assert_eq!(body["requests_by_endpoint"]["/api/v1/streams:start"], 1);
    assert_eq!(body["errors_total"], 1);
}

#[tokio::test]
async fn concurrent_uploads_of_one_name_do_not_mix() {
    let media = tempfile::tempdir().unwrap();
    let router = router_for(media.path(), |_| {});

    let first = vec![b'a'; 256 * 1024];
    let second = vec![b'b'; 256 * 1024];
    let ((s1, _), (s2, _)) = tokio::join!(
        send(&router, upload("clip.mp4", &first)),
        send(&router, upload("clip.mp4", &second)),
    );
    assert_eq!(s1, StatusCode::OK);
    assert_eq!(s2, StatusCode::OK);

    let saved = std::fs::read(media.path().join("clip.mp4")).unwrap();
    assert!(saved == first || saved == second, "upload bytes were interleaved");

    let leftovers: Vec<_> = std::fs::read_dir(media.path())
        .unwrap()
        .filter_map(Result::ok)
        .map(|e| e.file_name().to_string_lossy().to_string())
        .filter(|n| n.ends_with(".part"))
        .collect();
    assert!(leftovers.is_empty(), "{leftovers:?}");
}
