//! The entry model: one immutable log event and its on-disk rendering.
//!
//! # Line Format
//!
//! Each entry renders to exactly one line:
//!
//! ```text
//! [YYYY-MM-DD HH:MM:SS] <KIND> [UID:n] [DID:n] <message>
//! ```
//!
//! The `[UID:…]` and `[DID:…]` segments are omitted entirely when the
//! corresponding subject id is absent. Timestamps are local time with
//! second resolution.
//!
//! # Rendering
//!
//! Entries are rendered one at a time into a caller-owned scratch buffer
//! (see [`LogEntry::render_into`]); the formatter never materializes a
//! whole batch at once, so its memory use is bounded by the largest
//! single entry.

use std::fmt::Write as _;

use chrono::{DateTime, Local};

/// Classification of a log event. Closed set; callers cannot extend it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// An action initiated by a user (login, command, setting change).
    UserAction,
    /// An action performed on or by a managed device.
    DeviceAction,
    /// An internal system event (start-up, shutdown, timers).
    SystemEvent,
    /// An error condition reported by any collaborator.
    Error,
}

impl EntryKind {
    /// The fixed tag written into the log line for this kind.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            EntryKind::UserAction => "USER",
            EntryKind::DeviceAction => "DEVICE",
            EntryKind::SystemEvent => "SYSTEM",
            EntryKind::Error => "ERROR",
        }
    }
}

/// One immutable log event awaiting persistence.
///
/// Ownership transfers to the engine at emit time; the caller keeps no
/// handle it could mutate. Construction never fails and the message is
/// taken as-is, without validation.
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// Wall-clock time at construction. Rendered at second resolution.
    pub timestamp: DateTime<Local>,
    /// Event classification.
    pub kind: EntryKind,
    /// Free-form message text.
    pub message: String,
    /// Subject user id, if the event concerns a user.
    pub user_id: Option<i64>,
    /// Subject device id, if the event concerns a device.
    pub device_id: Option<i64>,
}

impl LogEntry {
    /// Creates an entry stamped with the current local time and no
    /// subject ids.
    #[must_use]
    pub fn new(kind: EntryKind, message: impl Into<String>) -> Self {
        LogEntry {
            timestamp: Local::now(),
            kind,
            message: message.into(),
            user_id: None,
            device_id: None,
        }
    }

    /// Attaches a subject user id.
    ///
    /// Negative ids are the legacy "absent" sentinel and are normalized
    /// to `None`.
    #[must_use]
    pub fn with_user_id(mut self, user_id: i64) -> Self {
        self.user_id = (user_id >= 0).then_some(user_id);
        self
    }

    /// Attaches a subject device id. Negative ids normalize to `None`.
    #[must_use]
    pub fn with_device_id(mut self, device_id: i64) -> Self {
        self.device_id = (device_id >= 0).then_some(device_id);
        self
    }

    /// Renders this entry as a single newline-terminated line into `out`.
    ///
    /// The buffer is cleared first so it can be reused across entries.
    pub(crate) fn render_into(&self, out: &mut String) {
        out.clear();
        // Writing into a String cannot fail.
        let _ = write!(
            out,
            "[{}] {} ",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.kind.tag()
        );
        if let Some(user_id) = self.user_id {
            let _ = write!(out, "[UID:{user_id}] ");
        }
        if let Some(device_id) = self.device_id {
            let _ = write!(out, "[DID:{device_id}] ");
        }
        out.push_str(&self.message);
        out.push('\n');
    }
}
