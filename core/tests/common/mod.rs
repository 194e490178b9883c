use std::path::{Path, PathBuf};

use streamcast_core::config::AppConfig;

/// Write an executable shell script standing in for the encoder.
#[cfg(unix)]
pub fn fake_encoder(dir: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("fake-ffmpeg");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

pub fn config_with_encoder(bin: &Path) -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.encoder.bin = bin.to_string_lossy().to_string();
    cfg
}

pub fn texts(poll: &streamcast_core::runner::LogPoll) -> Vec<String> {
    poll.lines.iter().map(|l| l.text.clone()).collect()
}
