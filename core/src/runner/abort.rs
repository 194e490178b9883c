use super::traits::RunnerSession;

/// Force-kill one run's encoder. Errors are logged, never returned.
pub async fn abort_sequence(session: &mut Box<dyn RunnerSession>, run_id: &str, reason: &str) {
    tracing::info!(run_id = %run_id, pid = ?session.pid(), reason = %reason, "stopping encoder");
    if let Err(e) = session.kill().await {
        tracing::warn!(run_id = %run_id, "kill failed: {}", e);
    }
}
