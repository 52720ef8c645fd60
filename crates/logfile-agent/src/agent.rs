//! Lifecycle controller and ingestion surface.
//!
//! A [`LogAgent`] is an explicitly constructed instance, shared by
//! reference (typically `Arc`) with every collaborator that needs to
//! log. There is no process-wide singleton; independent instances
//! pointed at different directories share nothing.
//!
//! # Lifecycle
//!
//! - [`LogAgent::start`] creates the log directory, opens the active
//!   file, spawns the batch worker, and only then returns. Calling it
//!   while already running is a no-op.
//! - [`LogAgent::stop`] signals cancellation, waits for the worker's
//!   final drain and flush, and returns. Calling it while stopped is a
//!   no-op.
//! - [`LogAgent::emit`]/[`LogAgent::emit_entry`] are fire-and-forget:
//!   they never block on I/O, never panic, and are silent no-ops when
//!   the engine is not running.

use std::io;
use std::path::PathBuf;
use std::sync::{PoisonError, RwLock};

use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::config::Config;
use crate::entry::{EntryKind, LogEntry};
use crate::worker::WriterTask;
use crate::writer::ActiveLogFile;

/// Start-up failure. The engine is left not-running and every
/// subsequent emit is a safe no-op.
#[derive(Debug, Error)]
pub enum StartError {
    /// The log directory could not be created.
    #[error("failed to create log directory {path:?}: {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The active log file could not be opened.
    #[error("failed to open active log file {path:?}: {source}")]
    OpenActiveFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// State held only while the engine is running.
struct Running {
    cancel: CancellationToken,
    worker: JoinHandle<()>,
}

/// The log ingestion and rotation engine.
pub struct LogAgent {
    config: Config,
    /// Sender slot read by `emit`; `None` whenever the engine is not
    /// running. The lock is held only for the send itself, which is the
    /// producers' single, brief exclusion window.
    sender: RwLock<Option<UnboundedSender<LogEntry>>>,
    /// Guards start/stop transitions so concurrent lifecycle calls
    /// serialize instead of double-spawning or double-joining.
    lifecycle: Mutex<Option<Running>>,
}

impl LogAgent {
    /// Creates a stopped engine. Nothing touches the filesystem until
    /// [`start`](Self::start).
    #[must_use]
    pub fn new(config: Config) -> Self {
        LogAgent {
            config,
            sender: RwLock::new(None),
            lifecycle: Mutex::new(None),
        }
    }

    /// The configuration this engine was built with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Whether the engine currently accepts entries.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.sender
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Starts the engine: creates the directory, opens the active file
    /// (recovering its size), and spawns the batch worker.
    ///
    /// Idempotent; a second call while running is a no-op.
    pub async fn start(&self) -> Result<(), StartError> {
        let mut lifecycle = self.lifecycle.lock().await;
        if lifecycle.is_some() {
            debug!("LOGFILE | start called while already running, ignoring");
            return Ok(());
        }

        tokio::fs::create_dir_all(&self.config.directory)
            .await
            .map_err(|source| StartError::CreateDirectory {
                path: self.config.directory.clone(),
                source,
            })?;
        let file = ActiveLogFile::open(&self.config)
            .await
            .map_err(|source| StartError::OpenActiveFile {
                path: self.config.directory.join(crate::constants::ACTIVE_FILE_NAME),
                source,
            })?;

        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let worker = tokio::spawn(WriterTask::new(rx, file, cancel.clone(), &self.config).run());

        *self
            .sender
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(tx);
        *lifecycle = Some(Running { cancel, worker });
        debug!("LOGFILE | started in {:?}", self.config.directory);
        Ok(())
    }

    /// Stops the engine: closes the ingestion surface, signals the
    /// worker, and waits for its final drain and flush.
    ///
    /// Entries enqueued before this call are on disk when it returns.
    /// Idempotent; a second call while stopped is a no-op.
    pub async fn stop(&self) {
        let mut lifecycle = self.lifecycle.lock().await;
        let Some(running) = lifecycle.take() else {
            debug!("LOGFILE | stop called while not running, ignoring");
            return;
        };

        // Close the surface first so emits racing with shutdown become
        // no-ops instead of landing after the final drain.
        *self
            .sender
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
        running.cancel.cancel();
        if let Err(e) = running.worker.await {
            error!("LOGFILE | writer task ended abnormally during shutdown: {e}");
        }
        debug!("LOGFILE | stopped");
    }

    /// Emits an event with no subject ids. Fire-and-forget; a no-op
    /// when the engine is not running.
    pub fn emit(&self, kind: EntryKind, message: impl Into<String>) {
        self.emit_entry(LogEntry::new(kind, message));
    }

    /// Emits a pre-built entry (used to attach subject ids).
    ///
    /// Never blocks on I/O and never panics; ownership of the entry
    /// transfers to the engine.
    pub fn emit_entry(&self, entry: LogEntry) {
        let sender = self.sender.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(tx) = sender.as_ref() {
            // A send can only fail if the worker is already gone; that
            // is indistinguishable from "not running" for the caller.
            let _ = tx.send(entry);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_agent(dir: &std::path::Path) -> LogAgent {
        LogAgent::new(Config {
            directory: dir.to_path_buf(),
            flush_interval_ms: 50,
            ..Config::default()
        })
    }

    #[tokio::test]
    async fn emit_before_start_is_a_noop() {
        let dir = tempfile::tempdir().expect("tempdir");
        let agent = test_agent(&dir.path().join("logs"));

        agent.emit(EntryKind::SystemEvent, "too early");

        assert!(!agent.is_running());
        assert!(!dir.path().join("logs").exists());
    }

    #[tokio::test]
    async fn start_creates_directory_and_active_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let logs = dir.path().join("nested").join("logs");
        let agent = test_agent(&logs);

        agent.start().await.expect("start");

        assert!(agent.is_running());
        assert!(logs.join("log.txt").exists());
        agent.stop().await;
    }

    #[tokio::test]
    async fn start_twice_is_idempotent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let agent = test_agent(dir.path());

        agent.start().await.expect("first start");
        agent.start().await.expect("second start");

        agent.emit(EntryKind::UserAction, "once only");
        agent.stop().await;

        let content = std::fs::read_to_string(dir.path().join("log.txt")).expect("read");
        assert_eq!(content.lines().count(), 1);
    }

    #[tokio::test]
    async fn stop_twice_is_idempotent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let agent = test_agent(dir.path());

        agent.start().await.expect("start");
        agent.stop().await;
        agent.stop().await;

        assert!(!agent.is_running());
    }

    #[tokio::test]
    async fn emit_after_stop_is_a_noop() {
        let dir = tempfile::tempdir().expect("tempdir");
        let agent = test_agent(dir.path());

        agent.start().await.expect("start");
        agent.emit(EntryKind::UserAction, "kept");
        agent.stop().await;
        agent.emit(EntryKind::UserAction, "dropped");

        let content = std::fs::read_to_string(dir.path().join("log.txt")).expect("read");
        assert_eq!(content.lines().count(), 1);
        assert!(content.contains("kept"));
    }

    #[tokio::test]
    async fn restart_after_stop_keeps_appending() {
        let dir = tempfile::tempdir().expect("tempdir");
        let agent = test_agent(dir.path());

        agent.start().await.expect("start");
        agent.emit(EntryKind::SystemEvent, "first run");
        agent.stop().await;

        agent.start().await.expect("restart");
        agent.emit(EntryKind::SystemEvent, "second run");
        agent.stop().await;

        let content = std::fs::read_to_string(dir.path().join("log.txt")).expect("read");
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("first run"));
        assert!(lines[1].ends_with("second run"));
    }

    #[tokio::test]
    async fn start_failure_reports_the_directory_and_leaves_engine_stopped() {
        let dir = tempfile::tempdir().expect("tempdir");
        // A plain file where the log directory should be.
        let blocked = dir.path().join("not-a-dir");
        std::fs::write(&blocked, "in the way").expect("seed");
        let agent = test_agent(&blocked);

        let err = agent.start().await.expect_err("start must fail");

        assert!(matches!(err, StartError::CreateDirectory { .. }));
        assert!(!agent.is_running());
        // Still a safe no-op after the failed start.
        agent.emit(EntryKind::Error, "ignored");
        agent.stop().await;
    }
}
