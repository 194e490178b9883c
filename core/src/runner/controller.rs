//! Handle-based stream controller: the command/query surface the UI calls.
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{mpsc, watch};

use crate::config::{AppConfig, EncoderConfig, RunLogConfig};
use crate::error::StreamError;
use crate::media;
use crate::util::{LogLine, RingLines};

use super::command::EncoderCommand;
use super::run::{run_stream, RunStreamArgs};
use super::traits::{LogSink, RunnerPlugin};
use super::types::{
    ControllerState, RunHandle, RunOutcome, RunPhase, RunSummary, StreamConfig,
};

const USER_STOP_REASON: &str = "stopped by user";

/// New lines of one run since a given sequence number.
#[derive(Debug, Clone, Serialize)]
pub struct LogPoll {
    pub run_id: String,
    pub phase: RunPhase,
    pub lines: Vec<LogLine>,
    pub last_seq: u64,
}

struct RunEntry {
    source: String,
    vertical: bool,
    started_at: DateTime<Utc>,
    log: Arc<RingLines>,
    abort_tx: mpsc::Sender<String>,
    phase_rx: watch::Receiver<RunPhase>,
    pid: Arc<Mutex<Option<u32>>>,
    outcome: Option<RunOutcome>,
}

impl RunEntry {
    fn phase(&self) -> RunPhase {
        *self.phase_rx.borrow()
    }

    fn summary(&self, run_id: &str) -> RunSummary {
        RunSummary {
            run_id: run_id.to_string(),
            source: self.source.clone(),
            vertical: self.vertical,
            phase: self.phase(),
            pid: *self.pid.lock().unwrap_or_else(|e| e.into_inner()),
            started_at: self.started_at,
            outcome: self.outcome.clone(),
        }
    }
}

pub struct StreamController {
    encoder: EncoderConfig,
    media_dir: PathBuf,
    log_cfg: RunLogConfig,
    allow_concurrent: bool,
    keep_finished: usize,
    plugin: Arc<dyn RunnerPlugin>,
    runs: Arc<Mutex<HashMap<String, RunEntry>>>,
}

impl StreamController {
    pub fn new(cfg: &AppConfig, media_dir: PathBuf, plugin: Arc<dyn RunnerPlugin>) -> Self {
        Self {
            encoder: cfg.encoder.clone(),
            media_dir,
            log_cfg: cfg.log.clone(),
            allow_concurrent: cfg.runs.allow_concurrent,
            keep_finished: cfg.runs.keep_finished,
            plugin,
            runs: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn lock_runs(&self) -> MutexGuard<'_, HashMap<String, RunEntry>> {
        self.runs.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn media_dir(&self) -> &Path {
        &self.media_dir
    }

    pub fn display_lines(&self) -> usize {
        self.log_cfg.display_lines
    }

    pub fn list_local_videos(&self) -> Result<Vec<String>, StreamError> {
        media::list_videos(&self.media_dir)
    }

    pub fn state(&self) -> ControllerState {
        let runs = self.lock_runs();
        if runs.values().any(|r| r.phase() == RunPhase::Running) {
            ControllerState::Running
        } else {
            ControllerState::Idle
        }
    }

    /// Validate `config` and launch the encoder on a background task.
    ///
    /// Must be called from within a Tokio runtime.
    #[tracing::instrument(name = "controller.start", skip_all, fields(vertical = config.vertical))]
    pub fn start(&self, config: StreamConfig) -> Result<RunHandle, StreamError> {
        config.validate()?;
        let requested = config.source.clone().unwrap_or_default();
        let source = media::resolve_source(&self.media_dir, &requested)?;

        let mut runs = self.lock_runs();
        if !self.allow_concurrent {
            if let Some((run_id, _)) = runs.iter().find(|(_, r)| r.phase() == RunPhase::Running) {
                return Err(StreamError::AlreadyRunning {
                    run_id: run_id.clone(),
                });
            }
        }
        prune_finished(&mut runs, self.keep_finished);

        let run_id = uuid::Uuid::new_v4().to_string();
        let start = EncoderCommand::new(
            &self.encoder,
            source.to_string_lossy(),
            config.stream_key.clone(),
        )
        .with_vertical(config.vertical)
        .into_start_args();

        let log = RingLines::new(self.log_cfg.capacity);
        let (abort_tx, abort_rx) = mpsc::channel::<String>(1);
        let (phase_tx, phase_rx) = watch::channel(RunPhase::Running);
        let pid = Arc::new(Mutex::new(None));

        runs.insert(
            run_id.clone(),
            RunEntry {
                source: requested.to_string_lossy().to_string(),
                vertical: config.vertical,
                started_at: Utc::now(),
                log: log.clone(),
                abort_tx,
                phase_rx,
                pid: pid.clone(),
                outcome: None,
            },
        );
        drop(runs);

        tracing::info!(run_id = %run_id, source = %source.display(), "stream starting");

        let plugin = self.plugin.clone();
        let registry = self.runs.clone();
        let line_channel_capacity = self.log_cfg.line_channel_capacity;
        let task_run_id = run_id.clone();
        tokio::spawn(async move {
            let sink: Arc<dyn LogSink> = log;
            let outcome = run_stream(RunStreamArgs {
                plugin: plugin.as_ref(),
                start,
                sink,
                abort_rx: Some(abort_rx),
                line_channel_capacity,
                run_id: &task_run_id,
                on_spawn: Some(Box::new(move |spawned: Option<u32>| {
                    *pid.lock().unwrap_or_else(|e| e.into_inner()) = spawned;
                })),
            })
            .await;

            let phase = outcome.phase;
            if let Some(entry) = registry
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .get_mut(&task_run_id)
            {
                entry.outcome = Some(outcome);
            }
            let _ = phase_tx.send(phase);
        });

        Ok(RunHandle { run_id })
    }

    /// Ask one run to stop. Returns whether a live run was signalled.
    ///
    /// Fire-and-forget: the run reaches `Stopped` asynchronously.
    pub fn stop(&self, handle: &RunHandle) -> bool {
        let runs = self.lock_runs();
        let Some(entry) = runs.get(&handle.run_id) else {
            return false;
        };
        signal_stop(&handle.run_id, entry)
    }

    /// Stop every run this controller started. Returns how many were signalled.
    pub fn stop_all(&self) -> usize {
        let runs = self.lock_runs();
        runs.iter()
            .filter(|(run_id, entry)| signal_stop(run_id, entry))
            .count()
    }

    pub fn poll_log(&self, handle: &RunHandle, since: u64) -> Option<LogPoll> {
        let runs = self.lock_runs();
        let entry = runs.get(&handle.run_id)?;
        let lines = if since == 0 {
            entry.log.tail(self.log_cfg.display_lines)
        } else {
            entry.log.since(since)
        };
        Some(LogPoll {
            run_id: handle.run_id.clone(),
            phase: entry.phase(),
            last_seq: entry.log.last_seq(),
            lines,
        })
    }

    pub fn status(&self, handle: &RunHandle) -> Option<RunSummary> {
        let runs = self.lock_runs();
        runs.get(&handle.run_id).map(|e| e.summary(&handle.run_id))
    }

    /// All known runs, oldest first.
    pub fn runs(&self) -> Vec<RunSummary> {
        let runs = self.lock_runs();
        let mut all: Vec<RunSummary> = runs.iter().map(|(id, e)| e.summary(id)).collect();
        all.sort_by_key(|s| s.started_at);
        all
    }

    /// Wait until the run ends and return its outcome.
    pub async fn wait(&self, handle: &RunHandle) -> Option<RunOutcome> {
        let mut phase_rx = {
            let runs = self.lock_runs();
            runs.get(&handle.run_id)?.phase_rx.clone()
        };
        if phase_rx.wait_for(|p| p.is_terminal()).await.is_err() {
            tracing::warn!(run_id = %handle.run_id, "run task vanished");
        }
        let runs = self.lock_runs();
        runs.get(&handle.run_id).and_then(|e| e.outcome.clone())
    }
}

fn signal_stop(run_id: &str, entry: &RunEntry) -> bool {
    if entry.phase() != RunPhase::Running {
        return false;
    }
    match entry.abort_tx.try_send(USER_STOP_REASON.to_string()) {
        Ok(()) => {
            tracing::info!(run_id = %run_id, "stop requested");
            true
        }
        // A stop is already queued for this run.
        Err(mpsc::error::TrySendError::Full(_)) => true,
        Err(mpsc::error::TrySendError::Closed(_)) => false,
    }
}

/// Drop the oldest finished runs beyond `keep`.
fn prune_finished(runs: &mut HashMap<String, RunEntry>, keep: usize) {
    let mut finished: Vec<(String, DateTime<Utc>)> = runs
        .iter()
        .filter(|(_, r)| r.phase().is_terminal())
        .map(|(id, r)| (id.clone(), r.started_at))
        .collect();
    if finished.len() <= keep {
        return;
    }
    finished.sort_by_key(|(_, at)| *at);
    let excess = finished.len() - keep;
    for (id, _) in finished.into_iter().take(excess) {
        runs.remove(&id);
    }
}
