use std::path::PathBuf;
use std::process::Stdio;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::io::AsyncRead;
use tokio::process::{Child, Command};

use super::traits::{RunnerPlugin, RunnerSession};
use super::types::RunnerStartArgs;

/// Launches the encoder as a child process with stdout and stderr sharing one pipe.
pub struct FfmpegRunnerPlugin {}

impl FfmpegRunnerPlugin {
    pub fn new() -> Self {
        Self {}
    }
}

impl Default for FfmpegRunnerPlugin {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RunnerPlugin for FfmpegRunnerPlugin {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn start_session(&self, args: &RunnerStartArgs) -> Result<Box<dyn RunnerSession>> {
        // Both descriptors point at the same pipe, so the kernel keeps the
        // interleaving the encoder wrote.
        let (reader, writer) = std::io::pipe().context("failed to create output pipe")?;
        let writer_err = writer
            .try_clone()
            .context("failed to duplicate output pipe")?;

        let mut cmd = Command::new(&args.cmd);
        cmd.args(&args.args)
            .stdin(Stdio::null())
            .stdout(writer)
            .stderr(writer_err)
            .kill_on_drop(true);
        let spawned = cmd.spawn();
        // Release the parent's write ends, otherwise the reader never sees EOF.
        drop(cmd);
        let child = spawned.with_context(|| format!("failed to launch '{}'", args.cmd))?;

        let output = async_reader(reader).context("failed to watch output pipe")?;

        tracing::info!(pid = ?child.id(), cmd = %args.cmd, "encoder started");
        Ok(Box::new(FfmpegRunnerSession {
            child,
            output: Some(output),
        }))
    }
}

#[cfg(unix)]
fn async_reader(reader: std::io::PipeReader) -> std::io::Result<Box<dyn AsyncRead + Unpin + Send>> {
    use std::os::fd::OwnedFd;

    let rx = tokio::net::unix::pipe::Receiver::from_owned_fd(OwnedFd::from(reader))?;
    Ok(Box::new(rx))
}

#[cfg(windows)]
fn async_reader(reader: std::io::PipeReader) -> std::io::Result<Box<dyn AsyncRead + Unpin + Send>> {
    use std::os::windows::io::OwnedHandle;

    let file = std::fs::File::from(OwnedHandle::from(reader));
    Ok(Box::new(tokio::fs::File::from_std(file)))
}

struct FfmpegRunnerSession {
    child: Child,
    output: Option<Box<dyn AsyncRead + Unpin + Send>>,
}

#[async_trait]
impl RunnerSession for FfmpegRunnerSession {
    fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    fn output(&mut self) -> Option<Box<dyn AsyncRead + Unpin + Send>> {
        self.output.take()
    }

    async fn kill(&mut self) -> Result<()> {
        // Already-exited children report an error here; that is not a failure to stop.
        if let Err(e) = self.child.kill().await {
            tracing::debug!("kill on exited encoder: {}", e);
        }
        Ok(())
    }

    async fn wait(&mut self) -> Result<Option<i32>> {
        let status = self.child.wait().await?;
        Ok(status.code())
    }
}

/// Full path of the encoder binary if it can be found on `PATH`.
pub fn resolve_encoder(bin: &str) -> Option<PathBuf> {
    which::which(bin).ok()
}
