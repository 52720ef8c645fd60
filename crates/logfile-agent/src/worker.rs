//! The batch worker: sole writer of the active log file.
//!
//! # Loop
//!
//! ```text
//!    emit() ──► mpsc channel ──► WriterTask ──► ActiveLogFile
//!                                   │
//!                 select! over:     │
//!                  - channel recv   │  drain ≤ batch_size, write
//!                  - interval tick  │  flush
//!                  - cancellation   │  final full drain, flush, exit
//! ```
//!
//! The worker drains up to `batch_size` entries per wakeup without ever
//! awaiting mid-batch, renders each entry into a reusable scratch
//! buffer, and appends it, rotating the file first when the append would
//! cross the size threshold. Buffered bytes reach the OS when the flush
//! interval has elapsed since the last flush or right after a rotation.
//!
//! # Failure policy
//!
//! Write, flush and rotation failures are reported on the side channel
//! (`tracing`) and the worker moves on; failed entries are dropped, not
//! retried. Only cancellation (or every sender dropping) ends the loop,
//! and both paths drain whatever is still queued before the final flush.

use tokio::sync::mpsc::{self, error::TryRecvError};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::entry::LogEntry;
use crate::writer::ActiveLogFile;

pub(crate) struct WriterTask {
    rx: mpsc::UnboundedReceiver<LogEntry>,
    file: ActiveLogFile,
    cancel: CancellationToken,
    flush_interval: std::time::Duration,
    batch_size: usize,
    batch: Vec<LogEntry>,
    /// Scratch buffer reused for rendering one entry at a time.
    line: String,
}

impl WriterTask {
    pub(crate) fn new(
        rx: mpsc::UnboundedReceiver<LogEntry>,
        file: ActiveLogFile,
        cancel: CancellationToken,
        config: &Config,
    ) -> Self {
        WriterTask {
            rx,
            file,
            cancel,
            flush_interval: config.flush_interval(),
            batch_size: config.batch_size.max(1),
            batch: Vec::with_capacity(config.batch_size.max(1)),
            line: String::new(),
        }
    }

    /// Runs until cancelled or until every sender is gone, then performs
    /// the final drain and flush.
    pub(crate) async fn run(mut self) {
        let mut ticker = tokio::time::interval(self.flush_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await; // discard first tick, which is instantaneous

        let mut last_flush = Instant::now();
        loop {
            tokio::select! {
                received = self.rx.recv() => {
                    let Some(entry) = received else {
                        // Every sender dropped without stop(); fall
                        // through to the final drain.
                        break;
                    };
                    self.batch.push(entry);
                    self.fill_batch(self.batch_size);
                    let rotated = self.write_batch().await;
                    if rotated || last_flush.elapsed() >= self.flush_interval {
                        self.flush().await;
                        last_flush = Instant::now();
                    }
                }
                _ = ticker.tick() => {
                    self.flush().await;
                    last_flush = Instant::now();
                }
                () = self.cancel.cancelled() => {
                    break;
                }
            }
        }

        // Final drain: everything queued at shutdown time is written,
        // with no batch-size cap.
        self.fill_batch(usize::MAX);
        self.write_batch().await;
        self.flush().await;
    }

    /// Moves queued entries into the batch without awaiting, up to `cap`
    /// entries total.
    fn fill_batch(&mut self, cap: usize) {
        while self.batch.len() < cap {
            match self.rx.try_recv() {
                Ok(entry) => self.batch.push(entry),
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
    }

    /// Renders and appends the drained batch in order. Returns whether
    /// any append rotated the file.
    async fn write_batch(&mut self) -> bool {
        let mut rotated = false;
        for entry in self.batch.drain(..) {
            entry.render_into(&mut self.line);
            match self.file.rotate_if_needed(self.line.len()).await {
                Ok(true) => rotated = true,
                Ok(false) => {}
                Err(e) => {
                    tracing::error!(
                        "LOGFILE | rotation failed, continuing on oversized file: {e}"
                    );
                }
            }
            if let Err(e) = self.file.append(&self.line).await {
                tracing::error!("LOGFILE | append failed, entry dropped: {e}");
            }
        }
        rotated
    }

    async fn flush(&mut self) {
        if let Err(e) = self.file.flush().await {
            tracing::error!("LOGFILE | flush failed: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::EntryKind;
    use std::path::Path;
    use std::time::Duration;

    fn test_config(dir: &Path) -> Config {
        Config {
            directory: dir.to_path_buf(),
            flush_interval_ms: 50,
            ..Config::default()
        }
    }

    async fn spawn_worker(
        config: &Config,
    ) -> (mpsc::UnboundedSender<LogEntry>, CancellationToken, tokio::task::JoinHandle<()>) {
        let file = ActiveLogFile::open(config).await.expect("open");
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let task = tokio::spawn(WriterTask::new(rx, file, cancel.clone(), config).run());
        (tx, cancel, task)
    }

    fn read_lines(dir: &Path) -> Vec<String> {
        let content =
            std::fs::read_to_string(dir.join(crate::constants::ACTIVE_FILE_NAME)).expect("read");
        content.lines().map(str::to_owned).collect()
    }

    #[tokio::test]
    async fn cancellation_drains_everything_queued() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = test_config(dir.path());
        let (tx, cancel, task) = spawn_worker(&config).await;

        for i in 0..250 {
            tx.send(LogEntry::new(EntryKind::SystemEvent, format!("event {i}")))
                .expect("send");
        }
        cancel.cancel();
        task.await.expect("worker join");

        let lines = read_lines(dir.path());
        assert_eq!(lines.len(), 250);
        assert!(lines[0].ends_with("event 0"));
        assert!(lines[249].ends_with("event 249"));
    }

    #[tokio::test]
    async fn entries_reach_disk_within_the_flush_interval() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = test_config(dir.path());
        let (tx, cancel, task) = spawn_worker(&config).await;

        tx.send(LogEntry::new(EntryKind::UserAction, "prompt flush"))
            .expect("send");
        tokio::time::sleep(Duration::from_millis(200)).await;

        let lines = read_lines(dir.path());
        assert_eq!(lines.len(), 1);
        assert!(lines[0].ends_with("prompt flush"));

        cancel.cancel();
        task.await.expect("worker join");
    }

    #[tokio::test]
    async fn worker_exits_when_all_senders_drop() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = test_config(dir.path());
        let (tx, _cancel, task) = spawn_worker(&config).await;

        tx.send(LogEntry::new(EntryKind::SystemEvent, "last words"))
            .expect("send");
        drop(tx);

        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("worker should exit")
            .expect("worker join");
        assert_eq!(read_lines(dir.path()).len(), 1);
    }
}
