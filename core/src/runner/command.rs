//! Encoder argument template.
use crate::config::EncoderConfig;

use super::types::RunnerStartArgs;

/// Output scale applied in vertical (shorts) mode.
pub const VERTICAL_SCALE_FILTER: &str = "scale=720:1280";

const REDACTED: &str = "****";

#[derive(Debug, Clone)]
pub struct EncoderCommand {
    settings: EncoderConfig,
    source: String,
    stream_key: String,
    vertical: bool,
}

impl EncoderCommand {
    pub fn new(
        settings: &EncoderConfig,
        source: impl Into<String>,
        stream_key: impl Into<String>,
    ) -> Self {
        Self {
            settings: settings.clone(),
            source: source.into(),
            stream_key: stream_key.into(),
            vertical: false,
        }
    }

    pub fn with_vertical(mut self, vertical: bool) -> Self {
        self.vertical = vertical;
        self
    }

    /// Ingest base with the key appended verbatim.
    pub fn destination(&self) -> String {
        format!("{}{}", self.settings.ingest_base, self.stream_key)
    }

    pub fn build(&self) -> Vec<String> {
        self.build_with_destination(self.destination())
    }

    fn build_with_destination(&self, destination: String) -> Vec<String> {
        let s = &self.settings;
        let gop = s.keyframe_interval.to_string();
        let mut args: Vec<String> = [
            "-re",
            "-stream_loop",
            "-1",
            "-i",
            self.source.as_str(),
            "-c:v",
            "libx264",
            "-preset",
            s.preset.as_str(),
            "-b:v",
            s.video_bitrate.as_str(),
            "-maxrate",
            s.maxrate.as_str(),
            "-bufsize",
            s.bufsize.as_str(),
            "-g",
            gop.as_str(),
            "-keyint_min",
            gop.as_str(),
            "-c:a",
            "aac",
            "-b:a",
            s.audio_bitrate.as_str(),
            "-f",
            "flv",
        ]
        .into_iter()
        .map(String::from)
        .collect();

        if self.vertical {
            args.push("-vf".to_string());
            args.push(VERTICAL_SCALE_FILTER.to_string());
        }
        args.push(destination);
        args
    }

    /// The full command line with the stream key masked.
    pub fn display_redacted(&self) -> String {
        let masked = format!("{}{}", self.settings.ingest_base, REDACTED);
        std::iter::once(self.settings.bin.clone())
            .chain(self.build_with_destination(masked))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn into_start_args(self) -> RunnerStartArgs {
        RunnerStartArgs {
            cmd: self.settings.bin.clone(),
            args: self.build(),
            display: self.display_redacted(),
        }
    }
}
