//! Assembly layer: merge CLI overrides into the config, build the controller, hand off to the server.
use std::path::PathBuf;
use std::sync::Arc;

use streamcast_core::api::{
    self as core_api, AppConfig, CliError, FfmpegRunnerPlugin, RunnerPlugin, StreamController,
};

use crate::commands::cli::ServeArgs;

/// Media directory from a CLI override, else the configured one.
pub fn media_dir(cfg: &AppConfig, cli_override: Option<&str>) -> PathBuf {
    match cli_override.map(str::trim).filter(|s| !s.is_empty()) {
        Some(dir) => {
            let mut cfg = cfg.clone();
            cfg.media.dir = dir.to_string();
            core_api::resolve_media_dir(&cfg)
        }
        None => core_api::resolve_media_dir(cfg),
    }
}

pub fn build_controller(cfg: &AppConfig, media_dir: PathBuf) -> StreamController {
    let plugin: Arc<dyn RunnerPlugin> = Arc::new(FfmpegRunnerPlugin::new());
    StreamController::new(cfg, media_dir, plugin)
}

#[tracing::instrument(name = "cli.run_server", skip_all)]
pub async fn run_server(args: ServeArgs, mut cfg: AppConfig) -> Result<i32, CliError> {
    if let Some(host) = args.host.as_ref().filter(|h| !h.trim().is_empty()) {
        cfg.server.host = host.clone();
    }
    if let Some(port) = args.port {
        cfg.server.port = port;
    }
    let media_dir = media_dir(&cfg, args.media_dir.as_deref());
    if !media_dir.is_dir() {
        return Err(CliError::Config(format!(
            "media directory does not exist: {}",
            media_dir.display()
        )));
    }

    let data_dir = core_api::get_data_dir()?;
    cfg.server.max_upload_size_mb = core_api::persist_upload_limit(&data_dir)?;

    match core_api::resolve_encoder(&cfg.encoder.bin) {
        Some(path) => tracing::info!(encoder = %path.display(), "encoder found"),
        None => tracing::warn!(
            "encoder '{}' not found on PATH; streams will fail until it is installed",
            cfg.encoder.bin
        ),
    }

    let controller = build_controller(&cfg, media_dir);
    crate::http::start_server(controller, cfg).await?;
    Ok(0)
}
