//! Constants for the on-disk layout and pipeline defaults.
//!
//! File names are part of the external contract (§on-disk layout): the
//! active file is always `log.txt` and retired generations are
//! `log_0.txt` (newest) through `log_{max_backups - 1}.txt` (oldest).

/// Name of the active, append-only log file inside the log directory.
pub(crate) const ACTIVE_FILE_NAME: &str = "log.txt";

/// Default log directory, relative to the working directory.
pub(crate) const DEFAULT_DIRECTORY: &str = "logs";

/// Default rotation threshold for the active file.
///
/// # Value: 10MiB (10,485,760 bytes)
///
/// The active file is rotated before an append would push it past this
/// size, so files on disk stay close to (and almost never above) the
/// threshold.
pub(crate) const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1_024 * 1_024;

/// Default number of retired backup generations kept on disk.
///
/// With the default file size this bounds total disk usage at roughly
/// `(1 + 5) * 10MiB`.
pub(crate) const DEFAULT_MAX_BACKUPS: usize = 5;

/// Default flush interval in milliseconds.
///
/// This is the maximum time an already-written entry may sit in the
/// user-space write buffer under no further load.
pub(crate) const DEFAULT_FLUSH_INTERVAL_MS: u64 = 5_000;

/// Default maximum number of entries drained and written per wakeup.
///
/// Bounding the batch keeps a single wakeup from monopolizing the worker
/// under a producer burst; anything left over is picked up immediately on
/// the next loop iteration.
pub(crate) const DEFAULT_BATCH_SIZE: usize = 100;

/// Builds the file name for a retired backup generation.
///
/// Generation 0 is the most recently rotated file.
pub(crate) fn backup_file_name(generation: usize) -> String {
    format!("log_{generation}.txt")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backup_names_follow_generation_index() {
        assert_eq!(backup_file_name(0), "log_0.txt");
        assert_eq!(backup_file_name(4), "log_4.txt");
    }
}
