//! Ordered progress output for concurrent generation tasks.
//!
//! A single spawned tokio task owns the output sink and drains an unbounded
//! channel of [`ProgressEvent`]s. Any number of cloned [`ProgressReporter`]s
//! can send from concurrent tasks; lines are written whole and in the order
//! the channel receives them, so output never interleaves.

use std::fmt;
use std::future::Future;
use std::io::Write;
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, oneshot};
use tracing::warn;

/// Events accepted by the progress writer.
#[derive(Debug)]
pub enum ProgressEvent {
    /// A task began.
    TaskStarted { label: String },
    /// A task ended, successfully or not.
    TaskFinished {
        label: String,
        elapsed: Duration,
        error: Option<String>,
    },
    /// A free-form line, written verbatim.
    Line(String),
    /// Flush the sink and acknowledge.
    Flush(oneshot::Sender<()>),
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgressEvent::TaskStarted { label } => write!(f, "[start] {}", label),
            ProgressEvent::TaskFinished {
                label,
                elapsed,
                error: None,
            } => write!(f, "[done]  {} ({:.2}s)", label, elapsed.as_secs_f64()),
            ProgressEvent::TaskFinished {
                label,
                elapsed,
                error: Some(error),
            } => write!(
                f,
                "[fail]  {} ({:.2}s): {}",
                label,
                elapsed.as_secs_f64(),
                error
            ),
            ProgressEvent::Line(line) => write!(f, "{}", line),
            ProgressEvent::Flush(_) => Ok(()),
        }
    }
}

/// Cloneable handle for sending progress events to the writer task.
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    tx: mpsc::UnboundedSender<ProgressEvent>,
}

impl ProgressReporter {
    /// Spawns the writer task over `sink` and returns a handle to it.
    ///
    /// Must be called from within a tokio runtime. The writer task exits
    /// once every reporter clone has been dropped.
    pub fn spawn<W>(sink: W) -> Self
    where
        W: Write + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(write_events(sink, rx));
        Self { tx }
    }

    /// Spawns a writer over standard output.
    pub fn stdout() -> Self {
        Self::spawn(std::io::stdout())
    }

    /// Queues an event. Events sent after the writer stopped are dropped.
    pub fn report(&self, event: ProgressEvent) {
        if self.tx.send(event).is_err() {
            warn!("Progress writer has stopped; dropping event");
        }
    }

    /// Queues a verbatim line.
    pub fn line(&self, line: impl Into<String>) {
        self.report(ProgressEvent::Line(line.into()));
    }

    /// Runs `task`, reporting its start, elapsed time and outcome under `label`.
    pub async fn timed<T, E, F>(&self, label: impl Into<String>, task: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        let label = label.into();
        self.report(ProgressEvent::TaskStarted {
            label: label.clone(),
        });
        let started = Instant::now();
        let result = task.await;
        self.report(ProgressEvent::TaskFinished {
            label,
            elapsed: started.elapsed(),
            error: result.as_ref().err().map(|e| e.to_string()),
        });
        result
    }

    /// Waits until every event queued so far has been written and flushed.
    pub async fn flush(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.report(ProgressEvent::Flush(ack_tx));
        // A closed channel means the writer is gone; nothing left to wait for.
        let _ = ack_rx.await;
    }
}

async fn write_events<W: Write>(mut sink: W, mut rx: mpsc::UnboundedReceiver<ProgressEvent>) {
    while let Some(event) = rx.recv().await {
        if let ProgressEvent::Flush(ack) = event {
            if let Err(e) = sink.flush() {
                warn!(error = %e, "Failed to flush progress output");
            }
            let _ = ack.send(());
            continue;
        }
        if let Err(e) = writeln!(sink, "{}", event) {
            warn!(error = %e, "Failed to write progress line");
        }
    }
    let _ = sink.flush();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// In-memory sink shared with the test.
    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().expect("lock not poisoned").clone())
                .expect("utf-8 output")
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().expect("lock not poisoned").extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_lines_are_written_in_send_order() {
        let buffer = SharedBuffer::default();
        let reporter = ProgressReporter::spawn(buffer.clone());

        reporter.line("first");
        reporter.report(ProgressEvent::TaskStarted {
            label: "go/solution".to_string(),
        });
        reporter.line("last");
        reporter.flush().await;

        assert_eq!(buffer.contents(), "first\n[start] go/solution\nlast\n");
    }

    #[tokio::test]
    async fn test_timed_reports_success_and_failure() {
        let buffer = SharedBuffer::default();
        let reporter = ProgressReporter::spawn(buffer.clone());

        let ok: Result<u8, String> = reporter.timed("go/hints", async { Ok(7) }).await;
        assert_eq!(ok, Ok(7));
        let failed: Result<u8, String> = reporter
            .timed("rust/hints", async { Err("bad json".to_string()) })
            .await;
        assert!(failed.is_err());
        reporter.flush().await;

        let output = buffer.contents();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "[start] go/hints");
        assert!(lines[1].starts_with("[done]  go/hints ("));
        assert_eq!(lines[2], "[start] rust/hints");
        assert!(lines[3].starts_with("[fail]  rust/hints ("));
        assert!(lines[3].ends_with("s): bad json"));
    }

    #[tokio::test]
    async fn test_concurrent_reporters_never_interleave_lines() {
        let buffer = SharedBuffer::default();
        let reporter = ProgressReporter::spawn(buffer.clone());

        let mut handles = Vec::new();
        for worker in 0..8 {
            let reporter = reporter.clone();
            handles.push(tokio::spawn(async move {
                for i in 0..25 {
                    reporter.line(format!("worker-{}-line-{}", worker, i));
                    tokio::task::yield_now().await;
                }
            }));
        }
        for handle in handles {
            handle.await.expect("worker task completes");
        }
        reporter.flush().await;

        let output = buffer.contents();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 200);
        assert!(lines.iter().all(|l| l.starts_with("worker-") && l.contains("-line-")));
        // Per-sender order is preserved.
        let worker_three: Vec<&str> = lines
            .iter()
            .copied()
            .filter(|l| l.starts_with("worker-3-"))
            .collect();
        let expected: Vec<String> = (0..25).map(|i| format!("worker-3-line-{}", i)).collect();
        assert_eq!(worker_three, expected);
    }

    #[test]
    fn test_finished_event_formatting() {
        let event = ProgressEvent::TaskFinished {
            label: "python".to_string(),
            elapsed: Duration::from_millis(1500),
            error: None,
        };
        assert_eq!(event.to_string(), "[done]  python (1.50s)");
    }
}
