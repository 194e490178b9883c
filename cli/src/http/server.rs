//! HTTP server lifecycle

use super::{
    middleware::{create_cors_layer, create_trace_layer, request_logger},
    routes::create_router,
    AppState,
};
use axum::middleware;
use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;
use streamcast_core::api::{get_data_dir, AppConfig, CliError, StreamController};
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{info, warn};
use uuid::Uuid;

const STATE_FILE: &str = "server.state";

fn state_file_path() -> Result<PathBuf, CliError> {
    let dir = get_data_dir()?;
    fs::create_dir_all(&dir)
        .map_err(|e| CliError::Command(format!("Failed to create data directory: {e}")))?;
    Ok(dir.join(STATE_FILE))
}

/// Record where this server listens so scripts can find it.
fn write_state_file(session_id: &str, host: &str, port: u16) -> Result<PathBuf, CliError> {
    let path = state_file_path()?;

    let state = serde_json::json!({
        "session_id": session_id,
        "port": port,
        "pid": std::process::id(),
        "url": format!("http://{}:{}", host, port),
        "started_at": chrono::Local::now().to_rfc3339()
    });

    let body = serde_json::to_string_pretty(&state)
        .map_err(|e| CliError::Command(format!("Failed to encode state file: {e}")))?;
    fs::write(&path, body)
        .map_err(|e| CliError::Command(format!("Failed to write state file: {e}")))?;

    info!("State file written to: {}", path.display());
    Ok(path)
}

/// Serve the control panel until Ctrl+C, SIGTERM or `POST /api/v1/shutdown`.
///
/// Every run still streaming is stopped before this returns.
pub async fn start_server(controller: StreamController, cfg: AppConfig) -> Result<(), CliError> {
    let session_id = Uuid::new_v4().to_string();
    let host = cfg.server.host.clone();
    let port = cfg.server.port;

    let (shutdown_tx, _) = broadcast::channel(1);
    let state = AppState::new(session_id.clone(), controller, cfg, shutdown_tx);

    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .map_err(|e| CliError::Config(format!("invalid listen address {host}:{port}: {e}")))?;
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    let state_file = write_state_file(&session_id, &host, port)?;
    info!(
        "HTTP server listening on http://{} (session: {})",
        addr, session_id
    );

    let app = create_router(state.clone())
        .layer(middleware::from_fn(request_logger))
        .layer(create_trace_layer())
        .layer(create_cors_layer());

    let mut shutdown_rx = state.shutdown_tx.subscribe();
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = signal::ctrl_c() => {
                    info!("Received Ctrl+C signal");
                }
                _ = shutdown_rx.recv() => {
                    info!("Received shutdown signal from API");
                }
                _ = wait_for_sigterm() => {
                    info!("Received SIGTERM signal");
                }
            }

            info!("Starting graceful shutdown...");
        })
        .await;

    let stopped = state.controller.stop_all();
    if stopped > 0 {
        info!(stopped, "stopping active runs");
        for run in state.controller.runs() {
            let _ = state
                .controller
                .wait(&streamcast_core::api::RunHandle { run_id: run.run_id })
                .await;
        }
    }

    if let Err(e) = fs::remove_file(&state_file) {
        warn!("Failed to remove state file: {}", e);
    }

    served?;
    info!("Server shutdown complete");
    Ok(())
}

#[cfg(unix)]
async fn wait_for_sigterm() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            warn!("SIGTERM handler unavailable: {}", e);
            std::future::pending::<()>().await
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_sigterm() {
    std::future::pending::<()>().await
}
