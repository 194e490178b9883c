mod abort;
mod command;
mod controller;
mod ffmpeg;
mod io_pump;
mod run;
mod sweep;
mod traits;
pub mod types;

#[cfg(test)]
mod testing;

pub use command::{EncoderCommand, VERTICAL_SCALE_FILTER};
pub use controller::{LogPoll, StreamController};
pub use ffmpeg::{resolve_encoder, FfmpegRunnerPlugin};
pub use run::{run_stream, RunStreamArgs, RUN_ENDED_MESSAGE};
pub use sweep::kill_by_name;
pub use traits::{LogSink, RunnerPlugin, RunnerSession};
pub use types::{
    ControllerState, RunHandle, RunOutcome, RunPhase, RunSummary, RunnerStartArgs, StreamConfig,
};
