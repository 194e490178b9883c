//! Foreground streaming: one run, output printed as it arrives.
use std::path::{Path, PathBuf};
use std::sync::Arc;

use streamcast_core::api::{
    run_stream, AppConfig, CliError, EncoderCommand, FfmpegRunnerPlugin, LogSink, RunPhase,
    RunStreamArgs, StreamConfig,
};
use streamcast_core::media::resolve_source;
use tokio::sync::mpsc;

use crate::commands::cli::StreamArgs;

pub async fn handle_stream(args: StreamArgs, cfg: &AppConfig) -> Result<i32, CliError> {
    let config = StreamConfig {
        source: args.source.map(PathBuf::from),
        stream_key: args.key.unwrap_or_default(),
        vertical: args.vertical,
    };
    config.validate()?;

    let media_dir = crate::app::media_dir(cfg, args.media_dir.as_deref());
    let source = resolve_source(
        &media_dir,
        config.source.as_deref().unwrap_or_else(|| Path::new("")),
    )?;

    let start = EncoderCommand::new(&cfg.encoder, source.to_string_lossy(), config.stream_key)
        .with_vertical(config.vertical)
        .into_start_args();

    let (abort_tx, abort_rx) = mpsc::channel::<String>(1);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = abort_tx.send("interrupted".to_string()).await;
        }
    });

    let sink: Arc<dyn LogSink> = Arc::new(|line: &str| println!("{line}"));
    let plugin = FfmpegRunnerPlugin::new();
    let run_id = uuid::Uuid::new_v4().to_string();

    let outcome = run_stream(RunStreamArgs {
        plugin: &plugin,
        start,
        sink,
        abort_rx: Some(abort_rx),
        line_channel_capacity: cfg.log.line_channel_capacity,
        run_id: &run_id,
        on_spawn: None,
    })
    .await;

    Ok(match outcome.phase {
        RunPhase::Stopped => 0,
        RunPhase::Failed => 20,
        RunPhase::Exited | RunPhase::Running => outcome.exit_code.unwrap_or(1),
    })
}
