use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

/// One retained log line with its position in the run's output.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct LogLine {
    pub seq: u64,
    pub text: String,
}

#[derive(Default)]
struct Inner {
    lines: VecDeque<LogLine>,
    next_seq: u64,
}

/// Bounded, thread-safe, append-only line log.
///
/// Sequence numbers start at 1 and keep increasing across evictions, so a
/// poller that remembers the last `seq` it saw never receives a line twice.
#[derive(Clone)]
pub struct RingLines {
    inner: Arc<Mutex<Inner>>,
    cap: usize,
}

impl RingLines {
    pub fn new(cap: usize) -> Arc<Self> {
        let cap = cap.max(1);
        Arc::new(Self {
            inner: Arc::new(Mutex::new(Inner {
                lines: VecDeque::with_capacity(cap.min(4096)),
                next_seq: 1,
            })),
            cap,
        })
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panicking writer cannot leave a half-pushed line behind.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn push(&self, text: impl Into<String>) -> u64 {
        let mut g = self.lock();
        let seq = g.next_seq;
        g.next_seq += 1;
        if g.lines.len() == self.cap {
            g.lines.pop_front();
        }
        g.lines.push_back(LogLine {
            seq,
            text: text.into(),
        });
        seq
    }

    /// The most recent `n` lines, oldest first.
    pub fn tail(&self, n: usize) -> Vec<LogLine> {
        let g = self.lock();
        let skip = g.lines.len().saturating_sub(n);
        g.lines.iter().skip(skip).cloned().collect()
    }

    /// Retained lines with `seq > after`, oldest first.
    pub fn since(&self, after: u64) -> Vec<LogLine> {
        let g = self.lock();
        g.lines.iter().filter(|l| l.seq > after).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sequence number of the newest line, 0 when nothing was pushed yet.
    pub fn last_seq(&self) -> u64 {
        self.lock().next_seq - 1
    }

    pub fn capacity(&self) -> usize {
        self.cap
    }
}
