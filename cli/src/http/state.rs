//! Shared HTTP server state

use chrono::{DateTime, Local};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockWriteGuard};
use streamcast_core::api::{AppConfig, StreamController};
use tokio::sync::broadcast;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub session_id: String,
    pub controller: Arc<StreamController>,
    pub config: Arc<AppConfig>,
    pub stats: Arc<RwLock<ServerStats>>,
    pub shutdown_tx: broadcast::Sender<()>,
}

impl AppState {
    pub fn new(
        session_id: String,
        controller: StreamController,
        config: AppConfig,
        shutdown_tx: broadcast::Sender<()>,
    ) -> Self {
        Self {
            session_id,
            controller: Arc::new(controller),
            config: Arc::new(config),
            stats: Arc::new(RwLock::new(ServerStats::new())),
            shutdown_tx,
        }
    }

    pub fn stats_mut(&self) -> RwLockWriteGuard<'_, ServerStats> {
        self.stats.write().unwrap_or_else(|p| p.into_inner())
    }

    pub fn record_request(&self, endpoint: &str) {
        self.stats_mut().increment_request(endpoint);
    }

    pub fn record_error(&self) {
        self.stats_mut().increment_error();
    }
}

pub struct ServerStats {
    pub requests_total: u64,
    pub requests_by_endpoint: HashMap<String, u64>,
    pub errors_total: u64,
    pub start_time: DateTime<Local>,
}

impl ServerStats {
    pub fn new() -> Self {
        Self {
            requests_total: 0,
            requests_by_endpoint: HashMap::new(),
            errors_total: 0,
            start_time: Local::now(),
        }
    }

    pub fn increment_request(&mut self, endpoint: &str) {
        self.requests_total += 1;
        *self
            .requests_by_endpoint
            .entry(endpoint.to_string())
            .or_insert(0) += 1;
    }

    pub fn increment_error(&mut self) {
        self.errors_total += 1;
    }

    pub fn uptime_seconds(&self) -> f64 {
        let now = Local::now();
        (now - self.start_time).num_milliseconds() as f64 / 1000.0
    }
}

impl Default for ServerStats {
    fn default() -> Self {
        Self::new()
    }
}
