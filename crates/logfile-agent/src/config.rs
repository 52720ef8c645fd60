//! Configuration for the log pipeline.
//!
//! Configuration sources are applied in order (later overrides earlier):
//!
//! 1. **Defaults** - hard-coded defaults in [`Config::default`]
//! 2. **Environment variables** - `LOG_AGENT_*` (see [`Config::from_env`])
//!
//! A host application that carries its own config file can also embed the
//! section directly: `Config` derives `Deserialize` with per-field
//! defaults, so partial sections work.
//!
//! Parsing is lenient throughout: an unparsable value is reported at
//! debug level and the default is kept, it never fails start-up.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::constants;

/// Environment variable naming the log directory.
const ENV_DIRECTORY: &str = "LOG_AGENT_DIRECTORY";
/// Environment variable for the rotation threshold in bytes.
const ENV_MAX_FILE_SIZE: &str = "LOG_AGENT_MAX_FILE_SIZE";
/// Environment variable for the backup generation cap.
const ENV_MAX_BACKUPS: &str = "LOG_AGENT_MAX_BACKUPS";
/// Environment variable for the flush interval in milliseconds.
const ENV_FLUSH_INTERVAL_MS: &str = "LOG_AGENT_FLUSH_INTERVAL_MS";
/// Environment variable for the per-wakeup drain cap.
const ENV_BATCH_SIZE: &str = "LOG_AGENT_BATCH_SIZE";

/// Settings recognized by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the active file and its backup generations.
    /// Created at start-up if missing.
    pub directory: PathBuf,
    /// Rotation threshold in bytes for the active file.
    pub max_file_size: u64,
    /// Maximum number of retired backup generations kept on disk.
    pub max_backups: usize,
    /// Flush interval in milliseconds; bounds how long a written entry
    /// may sit in the user-space buffer under no further load.
    pub flush_interval_ms: u64,
    /// Maximum number of entries drained and written per worker wakeup.
    pub batch_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            directory: PathBuf::from(constants::DEFAULT_DIRECTORY),
            max_file_size: constants::DEFAULT_MAX_FILE_SIZE,
            max_backups: constants::DEFAULT_MAX_BACKUPS,
            flush_interval_ms: constants::DEFAULT_FLUSH_INTERVAL_MS,
            batch_size: constants::DEFAULT_BATCH_SIZE,
        }
    }
}

impl Config {
    /// Builds a config from defaults overridden by `LOG_AGENT_*`
    /// environment variables.
    ///
    /// Unset variables keep the default; values that fail to parse are
    /// logged at debug level and ignored.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Config::default();
        if let Ok(directory) = env::var(ENV_DIRECTORY) {
            let trimmed = directory.trim();
            if trimmed.is_empty() {
                debug!("{ENV_DIRECTORY} is empty, keeping default");
            } else {
                config.directory = PathBuf::from(trimmed);
            }
        }
        merge_env_number(ENV_MAX_FILE_SIZE, &mut config.max_file_size);
        merge_env_number(ENV_MAX_BACKUPS, &mut config.max_backups);
        merge_env_number(ENV_FLUSH_INTERVAL_MS, &mut config.flush_interval_ms);
        merge_env_number(ENV_BATCH_SIZE, &mut config.batch_size);
        config
    }

    /// The flush interval as a [`Duration`].
    #[must_use]
    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }
}

/// Overrides `target` with the parsed value of `name` when it is set and
/// parsable; otherwise keeps the current value.
fn merge_env_number<T: std::str::FromStr>(name: &str, target: &mut T) {
    if let Ok(value) = env::var(name) {
        match value.trim().parse::<T>() {
            Ok(parsed) => *target = parsed,
            Err(_) => debug!("invalid value for {name}: {value:?}, keeping default"),
        }
    }
}
