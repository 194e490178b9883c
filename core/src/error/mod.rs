#[allow(clippy::module_inception)]
pub mod error;
pub mod stream;

pub use error::{CliError, RunnerError};
pub use stream::{StreamError, MISSING_INPUT_MESSAGE};
