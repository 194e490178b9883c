use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StreamError;

/// One start request from the UI: which file, which channel, which preset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamConfig {
    #[serde(default)]
    pub source: Option<PathBuf>,
    #[serde(default)]
    pub stream_key: String,
    #[serde(default)]
    pub vertical: bool,
}

impl StreamConfig {
    pub fn new(source: impl Into<PathBuf>, stream_key: impl Into<String>, vertical: bool) -> Self {
        Self {
            source: Some(source.into()),
            stream_key: stream_key.into(),
            vertical,
        }
    }

    /// Both a source and a non-blank key are required before anything is launched.
    pub fn validate(&self) -> Result<(), StreamError> {
        let has_source = self
            .source
            .as_ref()
            .map(|p| !p.as_os_str().is_empty())
            .unwrap_or(false);
        if !has_source || self.stream_key.trim().is_empty() {
            return Err(StreamError::MissingInput);
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct RunnerStartArgs {
    pub cmd: String,
    pub args: Vec<String>,
    /// Command line safe to show in logs (credentials masked).
    pub display: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    Running,
    /// The encoder exited on its own.
    Exited,
    /// Launch or read failure.
    Failed,
    /// Terminated through the controller.
    Stopped,
}

impl RunPhase {
    pub fn is_terminal(self) -> bool {
        !matches!(self, RunPhase::Running)
    }
}

/// Controller-level view: is anything streaming right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerState {
    Idle,
    Running,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutcome {
    pub run_id: String,
    pub phase: RunPhase,
    pub exit_code: Option<i32>,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,
}

/// Identifies one run started by a [`super::StreamController`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunHandle {
    pub run_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: String,
    pub source: String,
    pub vertical: bool,
    pub phase: RunPhase,
    pub pid: Option<u32>,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<RunOutcome>,
}
