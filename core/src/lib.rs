//! Encoder process control for rebroadcasting a local video to YouTube Live.
//!
//! [`runner::StreamController`] is the entry point: it validates a
//! [`runner::StreamConfig`], launches the encoder on a background task, keeps a
//! bounded log per run and stops runs by handle.

pub mod api;
pub mod config;
pub mod error;
pub mod media;
pub mod runner;
pub mod util;
