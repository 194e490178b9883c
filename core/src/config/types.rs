use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub encoder: EncoderConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub media: MediaConfig,

    #[serde(default)]
    pub log: RunLogConfig,

    #[serde(default)]
    pub runs: RunsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// If true, log to stderr.
    #[serde(default = "default_logging_console")]
    pub console: bool,

    /// If true, log to a file under `directory` (or OS temp dir if unset).
    #[serde(default = "default_logging_file")]
    pub file: bool,

    /// EnvFilter string, e.g. "info" or "streamcast_core=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    /// Optional directory for log files. If empty or unset, uses OS temp dir.
    #[serde(default)]
    pub directory: Option<String>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_console() -> bool {
    true
}

fn default_logging_file() -> bool {
    true
}

fn default_logging_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: default_logging_console(),
            file: default_logging_file(),
            level: default_logging_level(),
            directory: None,
        }
    }
}

/// Encoder binary and the constant encode template pushed to the ingest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncoderConfig {
    #[serde(default = "default_encoder_bin")]
    pub bin: String,

    #[serde(default = "default_preset")]
    pub preset: String,

    #[serde(default = "default_video_bitrate")]
    pub video_bitrate: String,

    #[serde(default = "default_maxrate")]
    pub maxrate: String,

    #[serde(default = "default_bufsize")]
    pub bufsize: String,

    /// Keyframe interval in frames (`-g` and `-keyint_min`).
    #[serde(default = "default_keyframe_interval")]
    pub keyframe_interval: u32,

    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate: String,

    /// Destination prefix; the stream key is appended verbatim.
    #[serde(default = "default_ingest_base")]
    pub ingest_base: String,
}

fn default_encoder_bin() -> String {
    "ffmpeg".to_string()
}

fn default_preset() -> String {
    "veryfast".to_string()
}

fn default_video_bitrate() -> String {
    "2500k".to_string()
}

fn default_maxrate() -> String {
    "2500k".to_string()
}

fn default_bufsize() -> String {
    "5000k".to_string()
}

fn default_keyframe_interval() -> u32 {
    60
}

fn default_audio_bitrate() -> String {
    "128k".to_string()
}

fn default_ingest_base() -> String {
    "rtmp://a.rtmp.youtube.com/live2/".to_string()
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            bin: default_encoder_bin(),
            preset: default_preset(),
            video_bitrate: default_video_bitrate(),
            maxrate: default_maxrate(),
            bufsize: default_bufsize(),
            keyframe_interval: default_keyframe_interval(),
            audio_bitrate: default_audio_bitrate(),
            ingest_base: default_ingest_base(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout for every route except uploads.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Overwritten from the persisted upload limit file at startup.
    #[serde(default = "default_max_upload_size_mb")]
    pub max_upload_size_mb: u64,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8501
}

fn default_request_timeout_secs() -> u64 {
    30
}

pub(crate) fn default_max_upload_size_mb() -> u64 {
    8192
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout_secs(),
            max_upload_size_mb: default_max_upload_size_mb(),
        }
    }
}

impl ServerConfig {
    pub fn max_upload_bytes(&self) -> usize {
        let bytes = self.max_upload_size_mb.saturating_mul(1024 * 1024);
        usize::try_from(bytes).unwrap_or(usize::MAX)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Directory scanned for local videos and receiving uploads. `~` is expanded.
    #[serde(default = "default_media_dir")]
    pub dir: String,
}

fn default_media_dir() -> String {
    ".".to_string()
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            dir: default_media_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunLogConfig {
    /// Lines retained per run before the oldest are evicted.
    #[serde(default = "default_log_capacity")]
    pub capacity: usize,

    /// Lines shown by the control page.
    #[serde(default = "default_display_lines")]
    pub display_lines: usize,

    #[serde(default = "default_line_channel_capacity")]
    pub line_channel_capacity: usize,
}

fn default_log_capacity() -> usize {
    1000
}

fn default_display_lines() -> usize {
    25
}

fn default_line_channel_capacity() -> usize {
    1024
}

impl Default for RunLogConfig {
    fn default() -> Self {
        Self {
            capacity: default_log_capacity(),
            display_lines: default_display_lines(),
            line_channel_capacity: default_line_channel_capacity(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunsConfig {
    /// Allow a new run while another is still running.
    #[serde(default)]
    pub allow_concurrent: bool,

    /// Finished runs (and their logs) kept for polling.
    #[serde(default = "default_keep_finished")]
    pub keep_finished: usize,
}

fn default_keep_finished() -> usize {
    20
}

impl Default for RunsConfig {
    fn default() -> Self {
        Self {
            allow_concurrent: false,
            keep_finished: default_keep_finished(),
        }
    }
}
