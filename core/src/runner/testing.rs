//! In-process stand-ins for the encoder, used by unit tests.
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWriteExt};
use tokio::task::JoinHandle;

use super::traits::{RunnerPlugin, RunnerSession};
use super::types::RunnerStartArgs;

#[derive(Clone)]
pub(crate) struct FakeScript {
    lines: Vec<String>,
    endless: bool,
    exit_code: i32,
}

impl FakeScript {
    /// Emit `lines` once and exit 0.
    pub(crate) fn lines(lines: &[&str]) -> Self {
        Self {
            lines: lines.iter().map(|l| l.to_string()).collect(),
            endless: false,
            exit_code: 0,
        }
    }

    /// Repeat `lines` until killed, like a looping input.
    pub(crate) fn endless(lines: &[&str]) -> Self {
        Self {
            endless: true,
            ..Self::lines(lines)
        }
    }
}

pub(crate) struct FakePlugin {
    script: Option<FakeScript>,
    fail_with: Option<String>,
    pub(crate) starts: Arc<AtomicUsize>,
    pub(crate) kills: Arc<AtomicUsize>,
    pub(crate) last_args: std::sync::Mutex<Option<RunnerStartArgs>>,
}

impl FakePlugin {
    pub(crate) fn new(script: FakeScript) -> Self {
        Self {
            script: Some(script),
            fail_with: None,
            starts: Arc::new(AtomicUsize::new(0)),
            kills: Arc::new(AtomicUsize::new(0)),
            last_args: std::sync::Mutex::new(None),
        }
    }

    pub(crate) fn failing(message: &str) -> Self {
        Self {
            script: None,
            fail_with: Some(message.to_string()),
            ..Self::new(FakeScript::lines(&[]))
        }
    }
}

#[async_trait]
impl RunnerPlugin for FakePlugin {
    fn name(&self) -> &str {
        "fake"
    }

    async fn start_session(&self, args: &RunnerStartArgs) -> anyhow::Result<Box<dyn RunnerSession>> {
        *self.last_args.lock().unwrap() = Some(args.clone());
        if let Some(msg) = &self.fail_with {
            anyhow::bail!("{}", msg);
        }
        self.starts.fetch_add(1, Ordering::SeqCst);
        let script = self.script.clone().unwrap_or_else(|| FakeScript::lines(&[]));
        Ok(Box::new(FakeSession::spawn(script, self.kills.clone())))
    }
}

struct FakeSession {
    output: Option<Box<dyn AsyncRead + Unpin + Send>>,
    writer: Option<JoinHandle<()>>,
    killed: bool,
    exit_code: i32,
    kills: Arc<AtomicUsize>,
}

impl FakeSession {
    fn spawn(script: FakeScript, kills: Arc<AtomicUsize>) -> Self {
        if !script.endless {
            let mut text = script.lines.join("\n");
            text.push('\n');
            return Self {
                output: Some(Box::new(Cursor::new(text.into_bytes()))),
                writer: None,
                killed: false,
                exit_code: script.exit_code,
                kills,
            };
        }

        let (mut wr, rd) = tokio::io::duplex(4096);
        let lines = script.lines.clone();
        let writer = tokio::spawn(async move {
            loop {
                for line in &lines {
                    if wr.write_all(format!("{line}\n").as_bytes()).await.is_err() {
                        return;
                    }
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        });
        Self {
            output: Some(Box::new(rd)),
            writer: Some(writer),
            killed: false,
            exit_code: script.exit_code,
            kills,
        }
    }
}

#[async_trait]
impl RunnerSession for FakeSession {
    fn pid(&self) -> Option<u32> {
        Some(4242)
    }

    fn output(&mut self) -> Option<Box<dyn AsyncRead + Unpin + Send>> {
        self.output.take()
    }

    async fn kill(&mut self) -> anyhow::Result<()> {
        self.killed = true;
        self.kills.fetch_add(1, Ordering::SeqCst);
        if let Some(writer) = &self.writer {
            writer.abort();
        }
        Ok(())
    }

    async fn wait(&mut self) -> anyhow::Result<Option<i32>> {
        if let Some(writer) = self.writer.as_mut() {
            let _ = writer.await;
            self.writer = None;
        }
        Ok(if self.killed { None } else { Some(self.exit_code) })
    }
}
