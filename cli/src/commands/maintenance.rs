use streamcast_core::api::{kill_by_name, list_videos, AppConfig, CliError};

use crate::commands::cli::VideosArgs;

pub fn handle_videos(args: VideosArgs, cfg: &AppConfig) -> Result<i32, CliError> {
    let dir = crate::app::media_dir(cfg, args.media_dir.as_deref());
    let videos = list_videos(&dir)?;
    if videos.is_empty() {
        eprintln!("no videos in {}", dir.display());
    }
    for name in videos {
        println!("{name}");
    }
    Ok(0)
}

pub fn handle_kill_encoders(cfg: &AppConfig) -> Result<i32, CliError> {
    let killed = kill_by_name(&cfg.encoder.bin);
    tracing::info!(bin = %cfg.encoder.bin, killed, "kill-encoders");
    println!("{killed} encoder process(es) signalled");
    Ok(0)
}
