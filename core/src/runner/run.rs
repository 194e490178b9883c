use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;

use crate::error::RunnerError;

use super::abort;
use super::io_pump;
use super::traits::{LogSink, RunnerPlugin};
use super::types::{RunOutcome, RunPhase, RunnerStartArgs};

/// Final line of every run, whatever ended it.
pub const RUN_ENDED_MESSAGE: &str = "Streaming finished or stopped.";

pub struct RunStreamArgs<'a> {
    pub plugin: &'a dyn RunnerPlugin,
    pub start: RunnerStartArgs,
    pub sink: Arc<dyn LogSink>,
    pub abort_rx: Option<mpsc::Receiver<String>>,
    pub line_channel_capacity: usize,
    pub run_id: &'a str,
    /// Called once the encoder process exists.
    pub on_spawn: Option<Box<dyn FnOnce(Option<u32>) + Send + 'a>>,
}

struct DriveEnd {
    exit_code: Option<i32>,
    stop_reason: Option<String>,
}

/// Run the encoder until it exits or is stopped, relaying its output.
///
/// Never fails: launch and read errors become one `Error: ...` line, and
/// [`RUN_ENDED_MESSAGE`] is always the last line delivered to the sink.
#[tracing::instrument(name = "runner.run_stream", skip_all, fields(run_id = %args.run_id))]
pub async fn run_stream(args: RunStreamArgs<'_>) -> RunOutcome {
    let started = Instant::now();
    let sink = args.sink.clone();
    let run_id = args.run_id.to_string();

    sink.emit(&format!("Running: {}", args.start.display));

    let (phase, exit_code, error, stop_reason) = match drive(args).await {
        Ok(DriveEnd {
            stop_reason: Some(reason),
            exit_code,
        }) => (RunPhase::Stopped, exit_code, None, Some(reason)),
        Ok(DriveEnd {
            stop_reason: None,
            exit_code,
        }) => (RunPhase::Exited, exit_code, None, None),
        Err(e) => {
            let text = format!("{e:#}");
            tracing::warn!(run_id = %run_id, "run failed: {}", text);
            sink.emit(&format!("Error: {text}"));
            (RunPhase::Failed, None, Some(text), None)
        }
    };

    sink.emit(RUN_ENDED_MESSAGE);

    let outcome = RunOutcome {
        run_id,
        phase,
        exit_code,
        duration_ms: started.elapsed().as_millis() as u64,
        error,
        stop_reason,
    };
    tracing::info!(
        phase = ?outcome.phase,
        exit_code = ?outcome.exit_code,
        duration_ms = outcome.duration_ms,
        "run ended"
    );
    outcome
}

async fn drive(args: RunStreamArgs<'_>) -> Result<DriveEnd, anyhow::Error> {
    let RunStreamArgs {
        plugin,
        start,
        sink,
        mut abort_rx,
        line_channel_capacity,
        run_id,
        on_spawn,
    } = args;

    let mut session = plugin
        .start_session(&start)
        .await
        .map_err(|e| RunnerError::Spawn(format!("{e:#}")))?;

    if let Some(cb) = on_spawn {
        cb(session.pid());
    }

    let (line_tx, mut line_rx) = mpsc::channel::<String>(line_channel_capacity.max(1));
    let pump = session
        .output()
        .map(|rd| io_pump::pump_output(rd, line_tx));

    let mut stop_reason: Option<String> = None;

    loop {
        tokio::select! {
            line = line_rx.recv() => match line {
                Some(line) => {
                    tracing::debug!(line = %line, "encoder");
                    sink.emit(&line);
                }
                None => break,
            },
            reason = recv_abort(&mut abort_rx), if stop_reason.is_none() => {
                sink.emit(&format!("Stop requested: {reason}"));
                abort::abort_sequence(&mut session, run_id, &reason).await;
                stop_reason = Some(reason);
            }
        }
    }

    let pump_error = match pump {
        Some(pump) => match pump.await {
            Ok(Ok(_)) => None,
            Ok(Err(e)) => Some(anyhow::Error::from(e)),
            Err(e) => Some(anyhow::Error::from(e)),
        },
        None => None,
    };
    if let Some(e) = pump_error {
        abort::abort_sequence(&mut session, run_id, "output read failed").await;
        let _ = session.wait().await;
        return Err(e);
    }

    // Output is closed but the process may linger; a stop must still reach it.
    let waited = if stop_reason.is_none() {
        tokio::select! {
            status = session.wait() => Some(status),
            reason = recv_abort(&mut abort_rx) => {
                sink.emit(&format!("Stop requested: {reason}"));
                abort::abort_sequence(&mut session, run_id, &reason).await;
                stop_reason = Some(reason);
                None
            }
        }
    } else {
        None
    };
    let exit_code = match waited {
        Some(status) => status?,
        None => session.wait().await?,
    };

    Ok(DriveEnd {
        exit_code,
        stop_reason,
    })
}

/// Next stop request; pending forever when there is no (live) sender.
async fn recv_abort(rx: &mut Option<mpsc::Receiver<String>>) -> String {
    if let Some(rx) = rx.as_mut() {
        if let Some(reason) = rx.recv().await {
            return reason;
        }
    }
    std::future::pending().await
}
