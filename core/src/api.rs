//! Stable re-exports for consumers (`cli` and external crates).
//!
//! Prefer importing from `streamcast_core::api` instead of reaching into internal modules.

pub use crate::config::{
    get_data_dir, load_default, persist_upload_limit, resolve_media_dir, AppConfig,
    EncoderConfig, LoggingConfig, ServerConfig,
};
pub use crate::error::{CliError, RunnerError, StreamError, MISSING_INPUT_MESSAGE};
pub use crate::media::{is_video_file, list_videos, sanitize_upload_name, VIDEO_EXTENSIONS};
pub use crate::runner::{
    kill_by_name, resolve_encoder, run_stream, ControllerState, EncoderCommand,
    FfmpegRunnerPlugin, LogPoll, LogSink, RunHandle, RunOutcome, RunPhase, RunStreamArgs,
    RunSummary, RunnerPlugin, RunnerSession, RunnerStartArgs, StreamConfig, StreamController,
    RUN_ENDED_MESSAGE,
};
pub use crate::util::{LogLine, RingLines};
