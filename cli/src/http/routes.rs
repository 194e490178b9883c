//! HTTP route handlers

use std::path::{Path, PathBuf};

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path as UrlPath, Query, State},
    response::Html,
    routing::{get, post},
    Json, Router,
};
use chrono::Local;
use streamcast_core::api::{sanitize_upload_name, RunHandle, StreamConfig, StreamError};
use tokio::io::AsyncWriteExt;

use crate::http::{
    middleware::create_timeout_layer,
    models::*,
    state::AppState,
    validation::{non_blank, validate_run_id},
};

const INDEX_HTML: &str = include_str!("../../assets/index.html");

/// Multipart field carrying the video.
const UPLOAD_FIELD: &str = "file";

/// Build every route. Uploads sit outside the request timeout and carry their own body limit.
pub fn create_router(state: AppState) -> Router {
    let timeout = create_timeout_layer(state.config.server.request_timeout_secs);
    let upload_limit = state.config.server.max_upload_bytes();

    let api = Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/api/v1/videos", get(videos_handler))
        .route("/api/v1/streams", get(list_streams_handler).post(start_handler))
        .route("/api/v1/streams/stop", post(stop_all_handler))
        .route("/api/v1/streams/:id", get(stream_status_handler))
        .route("/api/v1/streams/:id/stop", post(stop_handler))
        .route("/api/v1/streams/:id/log", get(log_handler))
        .route("/api/v1/shutdown", post(shutdown_handler))
        .layer(timeout);

    let upload = Router::new()
        .route("/api/v1/upload", post(upload_handler))
        .layer(DefaultBodyLimit::max(upload_limit));

    api.merge(upload).with_state(state)
}

/// GET / - control page
async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    state.record_request("/health");
    let (uptime, requests, by_endpoint, errors) = {
        let stats = state.stats_mut();
        (
            stats.uptime_seconds(),
            stats.requests_total,
            stats.requests_by_endpoint.clone(),
            stats.errors_total,
        )
    };

    Json(HealthResponse {
        status: "healthy".to_string(),
        session_id: state.session_id.clone(),
        state: state.controller.state(),
        uptime_seconds: uptime,
        requests_handled: requests,
        requests_by_endpoint: by_endpoint,
        errors_total: errors,
        timestamp: Local::now().to_rfc3339(),
    })
}

/// GET /api/v1/videos - local videos offered in the picker
async fn videos_handler(
    State(state): State<AppState>,
) -> Result<Json<VideosResponse>, HttpServerError> {
    state.record_request("/api/v1/videos");
    let videos = state.controller.list_local_videos().map_err(|e| {
        state.record_error();
        HttpServerError::from(e)
    })?;
    Ok(Json(VideosResponse {
        success: true,
        videos,
    }))
}

/// POST /api/v1/upload - save a video into the media directory, replacing any file of that name
async fn upload_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, HttpServerError> {
    state.record_request("/api/v1/upload");
    save_upload(&state, &mut multipart).await.map(Json).map_err(|e| {
        state.record_error();
        e
    })
}

async fn save_upload(
    state: &AppState,
    multipart: &mut Multipart,
) -> Result<UploadResponse, HttpServerError> {
    while let Some(mut field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let raw_name = field.file_name().map(str::to_string).ok_or_else(|| {
            HttpServerError::InvalidRequest("upload field has no file name".into())
        })?;
        let file_name = sanitize_upload_name(&raw_name)?;

        let media_dir = state.controller.media_dir();
        let dest = media_dir.join(&file_name);
        let partial = partial_path(media_dir, &file_name);
        let bytes = match write_field(&mut field, &partial).await {
            Ok(n) => n,
            Err(e) => {
                let _ = tokio::fs::remove_file(&partial).await;
                return Err(e);
            }
        };
        tokio::fs::rename(&partial, &dest)
            .await
            .map_err(StreamError::from)?;

        tracing::info!(file = %dest.display(), bytes, "upload saved");
        return Ok(UploadResponse {
            success: true,
            file_name,
            bytes,
        });
    }
    Err(HttpServerError::InvalidRequest(format!(
        "multipart field '{UPLOAD_FIELD}' is required"
    )))
}

/// Hidden, per-upload sibling so a half-written upload never shows up in the
/// picker and concurrent uploads of one name never share a file.
fn partial_path(dir: &Path, file_name: &str) -> PathBuf {
    dir.join(format!(".{file_name}.{}.part", uuid::Uuid::new_v4().simple()))
}

async fn write_field(
    field: &mut axum::extract::multipart::Field<'_>,
    path: &Path,
) -> Result<u64, HttpServerError> {
    let mut file = tokio::fs::File::create(path)
        .await
        .map_err(StreamError::from)?;
    let mut bytes = 0u64;
    while let Some(chunk) = field.chunk().await? {
        file.write_all(&chunk).await.map_err(StreamError::from)?;
        bytes += chunk.len() as u64;
    }
    file.flush().await.map_err(StreamError::from)?;
    Ok(bytes)
}

/// GET /api/v1/streams - all known runs
async fn list_streams_handler(State(state): State<AppState>) -> Json<RunsResponse> {
    state.record_request("/api/v1/streams");
    Json(RunsResponse {
        success: true,
        state: state.controller.state(),
        runs: state.controller.runs(),
    })
}

/// POST /api/v1/streams - start streaming
async fn start_handler(
    State(state): State<AppState>,
    Json(req): Json<StartStreamRequest>,
) -> Result<Json<StartStreamResponse>, HttpServerError> {
    state.record_request("/api/v1/streams:start");

    let config = StreamConfig {
        source: non_blank(req.source).map(PathBuf::from),
        stream_key: req.stream_key.unwrap_or_default(),
        vertical: req.vertical,
    };

    match state.controller.start(config) {
        Ok(handle) => Ok(Json(StartStreamResponse {
            success: true,
            run_id: handle.run_id,
        })),
        Err(e) => {
            state.record_error();
            Err(e.into())
        }
    }
}

/// POST /api/v1/streams/stop - stop every run this server started
async fn stop_all_handler(State(state): State<AppState>) -> Json<StopResponse> {
    state.record_request("/api/v1/streams/stop");
    let stopped = state.controller.stop_all();
    tracing::info!(stopped, "stop requested for all runs");
    Json(StopResponse {
        success: true,
        stopped,
    })
}

/// GET /api/v1/streams/:id
async fn stream_status_handler(
    State(state): State<AppState>,
    UrlPath(run_id): UrlPath<String>,
) -> Result<Json<RunResponse>, HttpServerError> {
    state.record_request("/api/v1/streams/:id");
    validate_run_id(&run_id)?;
    let run = state
        .controller
        .status(&RunHandle { run_id: run_id.clone() })
        .ok_or_else(|| unknown_run(&state, &run_id))?;
    Ok(Json(RunResponse { success: true, run }))
}

/// POST /api/v1/streams/:id/stop
async fn stop_handler(
    State(state): State<AppState>,
    UrlPath(run_id): UrlPath<String>,
) -> Result<Json<StopResponse>, HttpServerError> {
    state.record_request("/api/v1/streams/:id/stop");
    validate_run_id(&run_id)?;
    let handle = RunHandle { run_id };
    if state.controller.status(&handle).is_none() {
        return Err(unknown_run(&state, &handle.run_id));
    }
    let stopped = usize::from(state.controller.stop(&handle));
    Ok(Json(StopResponse {
        success: true,
        stopped,
    }))
}

/// GET /api/v1/streams/:id/log?since=N
async fn log_handler(
    State(state): State<AppState>,
    UrlPath(run_id): UrlPath<String>,
    Query(query): Query<LogQuery>,
) -> Result<Json<LogResponse>, HttpServerError> {
    state.record_request("/api/v1/streams/:id/log");
    validate_run_id(&run_id)?;
    let poll = state
        .controller
        .poll_log(&RunHandle { run_id: run_id.clone() }, query.since)
        .ok_or_else(|| unknown_run(&state, &run_id))?;
    Ok(Json(LogResponse {
        success: true,
        run_id: poll.run_id,
        phase: poll.phase,
        lines: poll.lines,
        last_seq: poll.last_seq,
    }))
}

fn unknown_run(state: &AppState, run_id: &str) -> HttpServerError {
    state.record_error();
    HttpServerError::NotFound(format!("unknown run '{run_id}'"))
}

/// POST /api/v1/shutdown
async fn shutdown_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    state.record_request("/api/v1/shutdown");
    tracing::info!("Shutdown requested via API");
    let _ = state.shutdown_tx.send(());
    Json(serde_json::json!({
        "success": true,
        "message": "Server shutting down"
    }))
}
