use async_trait::async_trait;
use tokio::io::AsyncRead;

use crate::util::RingLines;

use super::types::RunnerStartArgs;

/// A launched encoder process.
#[async_trait]
pub trait RunnerSession: Send {
    fn pid(&self) -> Option<u32>;
    /// Combined stdout and stderr, in the order the process wrote them.
    fn output(&mut self) -> Option<Box<dyn AsyncRead + Unpin + Send>>;
    async fn kill(&mut self) -> anyhow::Result<()>;
    /// Exit code, `None` when the process died from a signal.
    async fn wait(&mut self) -> anyhow::Result<Option<i32>>;
}

#[async_trait]
pub trait RunnerPlugin: Send + Sync {
    fn name(&self) -> &str;
    async fn start_session(&self, args: &RunnerStartArgs)
        -> anyhow::Result<Box<dyn RunnerSession>>;
}

/// Receives each output line of a run, in order.
pub trait LogSink: Send + Sync {
    fn emit(&self, line: &str);
}

impl<F> LogSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn emit(&self, line: &str) {
        self(line)
    }
}

impl LogSink for RingLines {
    fn emit(&self, line: &str) {
        self.push(line);
    }
}
