//! HTTP API data models

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use streamcast_core::api::{ControllerState, LogLine, RunPhase, RunSummary, StreamError};

// ============= Videos / Upload =============

#[derive(Debug, Serialize)]
pub struct VideosResponse {
    pub success: bool,
    pub videos: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub file_name: String,
    pub bytes: u64,
}

// ============= Streams =============

#[derive(Debug, Deserialize)]
pub struct StartStreamRequest {
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub stream_key: Option<String>,
    #[serde(default)]
    pub vertical: bool,
}

#[derive(Debug, Serialize)]
pub struct StartStreamResponse {
    pub success: bool,
    pub run_id: String,
}

#[derive(Debug, Serialize)]
pub struct StopResponse {
    pub success: bool,
    pub stopped: usize,
}

#[derive(Debug, Serialize)]
pub struct RunsResponse {
    pub success: bool,
    pub state: ControllerState,
    pub runs: Vec<RunSummary>,
}

#[derive(Debug, Serialize)]
pub struct RunResponse {
    pub success: bool,
    pub run: RunSummary,
}

#[derive(Debug, Default, Deserialize)]
pub struct LogQuery {
    /// Return lines after this sequence number; 0 or absent means the display tail.
    #[serde(default)]
    pub since: u64,
}

#[derive(Debug, Serialize)]
pub struct LogResponse {
    pub success: bool,
    pub run_id: String,
    pub phase: RunPhase,
    pub lines: Vec<LogLine>,
    pub last_seq: u64,
}

// ============= Health =============

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub session_id: String,
    pub state: ControllerState,
    pub uptime_seconds: f64,
    pub requests_handled: u64,
    pub requests_by_endpoint: HashMap<String, u64>,
    pub errors_total: u64,
    pub timestamp: String,
}

// ============= Error Handling =============

#[derive(Debug)]
pub enum HttpServerError {
    InvalidRequest(String),
    Stream(StreamError),
    NotFound(String),
    PayloadTooLarge(String),
}

impl From<axum::extract::multipart::MultipartError> for HttpServerError {
    fn from(e: axum::extract::multipart::MultipartError) -> Self {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge(e.body_text())
        } else {
            Self::InvalidRequest(e.body_text())
        }
    }
}

impl From<StreamError> for HttpServerError {
    fn from(e: StreamError) -> Self {
        Self::Stream(e)
    }
}

impl IntoResponse for HttpServerError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            Self::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST", msg),
            Self::Stream(e) => {
                let status = match &e {
                    StreamError::MissingInput | StreamError::InvalidUpload(_) => {
                        StatusCode::BAD_REQUEST
                    }
                    StreamError::SourceNotFound(_) => StatusCode::NOT_FOUND,
                    StreamError::AlreadyRunning { .. } => StatusCode::CONFLICT,
                    StreamError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, e.code(), e.to_string())
            }
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            Self::PayloadTooLarge(msg) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE", msg)
            }
        };

        let body = serde_json::json!({
            "success": false,
            "error": message,
            "error_code": error_code,
        });

        (status, Json(body)).into_response()
    }
}
