use std::path::{Path, PathBuf};

use super::types::{default_max_upload_size_mb, AppConfig};

const UPLOAD_LIMIT_FILE: &str = "server.toml";

/// Get the default streamcast data directory: ~/.streamcast
pub fn get_data_dir() -> anyhow::Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(home.join(".streamcast"))
}

pub fn load_default() -> anyhow::Result<AppConfig> {
    let data_dir = get_data_dir()?;
    let mut cfg = load_from_paths(&data_dir.join("config.toml"), Path::new("config.toml"))?;

    if cfg
        .logging
        .directory
        .as_deref()
        .map(|s| s.trim().is_empty())
        .unwrap_or(true)
    {
        let logs_dir = data_dir.join("logs");
        std::fs::create_dir_all(&logs_dir)?;
        cfg.logging.directory = Some(logs_dir.to_string_lossy().to_string());
    }

    apply_env_overrides(&mut cfg, |key| std::env::var(key).ok());
    Ok(cfg)
}

/// Priority: `primary` (user config) over `local` (working directory), else defaults.
pub fn load_from_paths(primary: &Path, local: &Path) -> anyhow::Result<AppConfig> {
    let path = if primary.exists() {
        primary
    } else if local.exists() {
        local
    } else {
        return Ok(AppConfig::default());
    };

    let s = std::fs::read_to_string(path)?;
    let cfg = toml::from_str::<AppConfig>(&s)?;
    tracing::debug!(path = %path.display(), "config loaded");
    Ok(cfg)
}

pub fn apply_env_overrides<F>(cfg: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = non_empty("STREAMCAST_ENCODER_BIN") {
        cfg.encoder.bin = v;
    }
    if let Some(v) = non_empty("STREAMCAST_MEDIA_DIR") {
        cfg.media.dir = v;
    }
    if let Some(v) = non_empty("STREAMCAST_PORT") {
        match v.trim().parse::<u16>() {
            Ok(port) => cfg.server.port = port,
            Err(e) => tracing::warn!("ignoring STREAMCAST_PORT={}: {}", v, e),
        }
    }
}

/// Expand `~` and environment references in the media directory.
pub fn resolve_media_dir(cfg: &AppConfig) -> PathBuf {
    let raw = cfg.media.dir.trim();
    let raw = if raw.is_empty() { "." } else { raw };
    match shellexpand::full(raw) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(e) => {
            tracing::warn!("media dir expansion failed ({}), using it verbatim", e);
            PathBuf::from(raw)
        }
    }
}

/// Rewrite the upload limit file in `dir` and return the limit it holds.
///
/// Runs on every startup, so a hand-edited value does not survive a restart.
pub fn persist_upload_limit(dir: &Path) -> anyhow::Result<u64> {
    std::fs::create_dir_all(dir)?;
    let limit = default_max_upload_size_mb();
    let path = dir.join(UPLOAD_LIMIT_FILE);
    std::fs::write(&path, format!("[server]\nmax_upload_size_mb = {limit}\n"))?;
    tracing::info!(path = %path.display(), limit_mb = limit, "upload limit written");
    Ok(limit)
}
