use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::RunnerError;

/// Longest line forwarded in one piece; longer runs without a break are split.
pub(crate) const MAX_LINE_BYTES: usize = 16 * 1024;

/// Split the encoder's merged output into lines and forward them in order.
///
/// `\n`, `\r` and `\r\n` all end a line: the encoder redraws its progress
/// line with bare carriage returns. Blank lines are dropped.
pub fn pump_output<R>(mut rd: R, line_tx: mpsc::Sender<String>) -> JoinHandle<Result<u64, RunnerError>>
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = vec![0u8; 16 * 1024];
        let mut total = 0u64;
        let mut line_buf: Vec<u8> = Vec::with_capacity(8 * 1024);
        let mut skip_lf = false;

        loop {
            let n = rd.read(&mut buf).await.map_err(|e| RunnerError::StreamIo {
                stream: "output",
                source: e,
            })?;
            if n == 0 {
                break;
            }
            total += n as u64;

            for &b in &buf[..n] {
                match b {
                    b'\n' if skip_lf => skip_lf = false,
                    b'\n' | b'\r' => {
                        skip_lf = b == b'\r';
                        deliver(&mut line_buf, &line_tx).await;
                    }
                    _ => {
                        skip_lf = false;
                        line_buf.push(b);
                        if line_buf.len() >= MAX_LINE_BYTES {
                            deliver(&mut line_buf, &line_tx).await;
                        }
                    }
                }
            }
        }

        // EOF flush: deliver the last partial line if it doesn't end with '\n'.
        deliver(&mut line_buf, &line_tx).await;

        Ok(total)
    })
}

async fn deliver(line_buf: &mut Vec<u8>, line_tx: &mpsc::Sender<String>) {
    let line = String::from_utf8_lossy(line_buf).trim_end().to_string();
    line_buf.clear();
    if !line.is_empty() {
        let _ = line_tx.send(line).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    async fn collect(rx: &mut mpsc::Receiver<String>) -> Vec<String> {
        let mut out = Vec::new();
        while let Some(line) = rx.recv().await {
            out.push(line);
        }
        out
    }

    #[tokio::test]
    async fn flushes_last_line_without_newline_on_eof() {
        let (mut wr, rd) = tokio::io::duplex(1024);
        let (tx, mut rx) = mpsc::channel::<String>(8);

        let task = pump_output(rd, tx);

        wr.write_all(b"hello").await.unwrap();
        drop(wr);

        assert_eq!(rx.recv().await.as_deref(), Some("hello"));
        assert_eq!(task.await.unwrap().unwrap(), 5);
    }

    #[tokio::test]
    async fn splits_on_every_line_ending() {
        let (mut wr, rd) = tokio::io::duplex(1024);
        let (tx, mut rx) = mpsc::channel::<String>(16);
        let task = pump_output(rd, tx);

        wr.write_all(b"one\ntwo\r\nframe=1\rframe=2\r\n\nlast").await.unwrap();
        drop(wr);

        assert_eq!(
            collect(&mut rx).await,
            vec!["one", "two", "frame=1", "frame=2", "last"]
        );
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn crlf_split_across_reads_is_one_break() {
        let (mut wr, rd) = tokio::io::duplex(1024);
        let (tx, mut rx) = mpsc::channel::<String>(16);
        let task = pump_output(rd, tx);

        wr.write_all(b"a\r").await.unwrap();
        tokio::task::yield_now().await;
        wr.write_all(b"\nb\n").await.unwrap();
        drop(wr);

        assert_eq!(collect(&mut rx).await, vec!["a", "b"]);
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn unbroken_output_is_split_at_the_line_cap() {
        let (mut wr, rd) = tokio::io::duplex(4096);
        let (tx, mut rx) = mpsc::channel::<String>(16);
        let task = pump_output(rd, tx);

        let writer = tokio::spawn(async move {
            wr.write_all(&vec![b'x'; MAX_LINE_BYTES + 10]).await.unwrap();
            wr.write_all(b"\nend\n").await.unwrap();
        });

        let lens: Vec<usize> = collect(&mut rx).await.iter().map(String::len).collect();
        assert_eq!(lens, vec![MAX_LINE_BYTES, 10, 3]);
        writer.await.unwrap();
        task.await.unwrap().unwrap();
    }
}
