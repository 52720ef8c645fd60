//! The active log file: buffered appends, a running size counter, and
//! the rotation trigger.
//!
//! Exactly one [`ActiveLogFile`] exists per running engine and it is
//! owned by the batch worker, so nothing here needs locking. The size
//! counter tracks bytes written by this process since the file was
//! opened (recovered once from the file length at open, never re-read
//! per write).
//!
//! Appends go through a [`BufWriter`]; data reaches the OS on
//! [`ActiveLogFile::flush`], which the worker calls on its flush-interval
//! schedule and after rotations.

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};

use crate::config::Config;
use crate::constants::ACTIVE_FILE_NAME;
use crate::rotation;

pub(crate) struct ActiveLogFile {
    dir: PathBuf,
    max_file_size: u64,
    max_backups: usize,
    /// `None` only transiently, when a failed rotation could not reopen
    /// the file; the next append retries the open.
    writer: Option<BufWriter<File>>,
    /// Bytes written to the active file since it was opened, including
    /// bytes still sitting in the user-space buffer.
    size: u64,
}

impl ActiveLogFile {
    /// Opens (or creates) the active file in append mode and recovers
    /// the size counter from the existing file length.
    pub(crate) async fn open(config: &Config) -> io::Result<Self> {
        let mut active = ActiveLogFile {
            dir: config.directory.clone(),
            max_file_size: config.max_file_size,
            max_backups: config.max_backups,
            writer: None,
            size: 0,
        };
        active.reopen().await?;
        Ok(active)
    }

    /// Path of the active file.
    pub(crate) fn path(&self) -> PathBuf {
        self.dir.join(ACTIVE_FILE_NAME)
    }

    /// Rotates first when appending `pending_bytes` would push the file
    /// past the threshold. Returns whether a rotation happened.
    ///
    /// A failed rotation leaves the engine appending to the oversized
    /// active file; the error is returned for the worker to report.
    pub(crate) async fn rotate_if_needed(&mut self, pending_bytes: usize) -> io::Result<bool> {
        // An empty file is never rotated, even for an oversized entry;
        // cycling generations would retire nothing.
        if self.size == 0 || self.size.saturating_add(pending_bytes as u64) <= self.max_file_size {
            return Ok(false);
        }
        self.rotate().await?;
        Ok(true)
    }

    /// Appends one rendered line and advances the size counter.
    pub(crate) async fn append(&mut self, line: &str) -> io::Result<()> {
        if self.writer.is_none() {
            self.reopen().await?;
        }
        if let Some(writer) = self.writer.as_mut() {
            writer.write_all(line.as_bytes()).await?;
            self.size += line.len() as u64;
        }
        Ok(())
    }

    /// Pushes buffered bytes to the OS.
    pub(crate) async fn flush(&mut self) -> io::Result<()> {
        if let Some(writer) = self.writer.as_mut() {
            writer.flush().await?;
        }
        Ok(())
    }

    /// Retires the active file into generation 0 and opens a fresh one.
    ///
    /// The active file stays closed while generations are shuffled, so
    /// no write can land mid-shuffle. With `max_backups == 0` there is
    /// no slot to retire into: the active file is deleted instead, which
    /// keeps the backup-cap invariant with an empty set.
    ///
    /// On failure the active file is reopened (best effort) before the
    /// error is returned, so appending can continue.
    async fn rotate(&mut self) -> io::Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush().await?;
            // Dropping the writer closes the handle.
        }
        let result = self.retire_active().await;
        let reopen = self.reopen().await;
        result.and(reopen)
    }

    async fn retire_active(&mut self) -> io::Result<()> {
        if self.max_backups == 0 {
            fs::remove_file(self.path()).await
        } else {
            rotation::shift_backups(&self.dir, self.max_backups).await?;
            fs::rename(self.path(), rotation::backup_path(&self.dir, 0)).await
        }
    }

    /// (Re)opens the active file in append mode and resets the size
    /// counter from its current length.
    async fn reopen(&mut self) -> io::Result<()> {
        let file = open_append(&self.path()).await?;
        self.size = file.metadata().await?.len();
        self.writer = Some(BufWriter::new(file));
        Ok(())
    }
}

pub(crate) async fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path).await
}
