//! # Logfile Agent
//!
//! An asynchronous, size-bounded, crash-tolerant log ingestion and
//! rotation engine. Arbitrarily many concurrent callers hand structured
//! events to a fire-and-forget [`emit`](LogAgent::emit) surface; one
//! background task batches them, appends them to an active `log.txt`,
//! and rotates the file through a bounded set of backup generations
//! (`log_0.txt` newest … `log_{max_backups-1}.txt` oldest) once it grows
//! past the configured size.
//!
//! ## Architecture
//!
//! ```text
//!    callers (any task/thread)
//!        │ emit(kind, message, ids…)      never blocks on I/O
//!        v
//!    ┌────────────────┐
//!    │  mpsc channel  │  global FIFO, multi-producer
//!    └───────┬────────┘
//!            v
//!    ┌────────────────┐
//!    │  batch worker  │  single consumer, sole writer
//!    └───────┬────────┘
//!            v
//!    ┌────────────────┐     size threshold crossed
//!    │  active file   │ ──────────────────────────► rotation
//!    └────────────────┘     log.txt → log_0.txt → … (oldest deleted)
//! ```
//!
//! ## Guarantees
//!
//! - Entries appear on disk in global enqueue order.
//! - Nothing enqueued before [`stop`](LogAgent::stop) is lost; shutdown
//!   drains the queue before the final flush.
//! - Under no further load an entry reaches disk within one flush
//!   interval.
//! - Best-effort durability only: a mid-batch I/O failure is reported
//!   via `tracing` and the affected entries are dropped, not retried.
//!
//! ## Example
//!
//! ```rust,no_run
//! use logfile_agent::{Config, EntryKind, LogAgent, LogEntry};
//!
//! # async fn example() -> Result<(), logfile_agent::StartError> {
//! let agent = std::sync::Arc::new(LogAgent::new(Config::default()));
//! agent.start().await?;
//!
//! agent.emit(EntryKind::SystemEvent, "engine online");
//! agent.emit_entry(
//!     LogEntry::new(EntryKind::UserAction, "logged in").with_user_id(7),
//! );
//!
//! agent.stop().await; // drains and flushes
//! # Ok(())
//! # }
//! ```

#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(unused_extern_crates)]
#![deny(unreachable_pub)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]

/// Lifecycle controller and ingestion surface
pub mod agent;

/// Configuration - defaults, environment overrides, serde embedding
pub mod config;

/// On-disk layout constants and pipeline defaults
mod constants;

/// The entry model and its single-line rendering
pub mod entry;

/// Backup generation shifting for rotation
mod rotation;

/// The batch worker task
mod worker;

/// The active file, size counter, and rotation trigger
mod writer;

pub use agent::{LogAgent, StartError};
pub use config::Config;
pub use entry::{EntryKind, LogEntry};
