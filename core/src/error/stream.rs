use thiserror::Error;

/// Shown when a start request lacks a source file or a stream key.
pub const MISSING_INPUT_MESSAGE: &str = "Please select a video and enter a stream key first.";

/// Reasons a stream request is refused before any encoder is launched.
#[derive(Error, Debug)]
pub enum StreamError {
    #[error("{}", MISSING_INPUT_MESSAGE)]
    MissingInput,

    #[error("a stream is already running ({run_id})")]
    AlreadyRunning { run_id: String },

    #[error("source file not found: {0}")]
    SourceNotFound(String),

    #[error("invalid upload: {0}")]
    InvalidUpload(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl StreamError {
    /// Stable machine-readable code for API clients.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingInput => "MISSING_INPUT",
            Self::AlreadyRunning { .. } => "ALREADY_RUNNING",
            Self::SourceNotFound(_) => "SOURCE_NOT_FOUND",
            Self::InvalidUpload(_) => "INVALID_UPLOAD",
            Self::Io(_) => "IO_ERROR",
        }
    }
}
