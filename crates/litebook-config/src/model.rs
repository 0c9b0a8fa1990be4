// SPDX-FileCopyrightText: 2026 Litebook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Litebook sync core.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::path::PathBuf;
use std::time::Duration;

use litebook_core::CheckpointMode;
use serde::{Deserialize, Serialize};

/// Top-level Litebook configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LitebookConfig {
    /// Local database file settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Remote mirror and sync scheduling settings.
    #[serde(default)]
    pub sync: SyncConfig,

    /// Process-level settings.
    #[serde(default)]
    pub daemon: DaemonConfig,
}

impl LitebookConfig {
    /// Path of the live local database file.
    ///
    /// Defaults to `<tmp>/<database_name>`.
    pub fn local_path(&self) -> PathBuf {
        match &self.storage.local_path {
            Some(path) => PathBuf::from(path),
            None => std::env::temp_dir().join(&self.storage.database_name),
        }
    }

    /// Path of the durable mirror on the network mount.
    ///
    /// Defaults to `/mnt/gcs/<database_name>`.
    pub fn remote_path(&self) -> PathBuf {
        match &self.sync.remote_path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_MOUNT).join(&self.storage.database_name),
        }
    }

    /// Path of the checksum baseline. Defaults to `<local_path>.sum`.
    pub fn checksum_path(&self) -> PathBuf {
        match &self.sync.checksum_path {
            Some(path) => PathBuf::from(path),
            None => {
                let mut path = self.local_path().into_os_string();
                path.push(".sum");
                PathBuf::from(path)
            }
        }
    }

    /// Path of the scratch snapshot. Defaults to `<local_path>` with a `.snap` extension.
    pub fn snapshot_path(&self) -> PathBuf {
        match &self.sync.snapshot_path {
            Some(path) => PathBuf::from(path),
            None => self.local_path().with_extension("snap"),
        }
    }

    /// Render as TOML, e.g. to show the effective configuration.
    ///
    /// Unset optional paths are omitted rather than resolved.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

const DEFAULT_MOUNT: &str = "/mnt/gcs";

/// Local SQLite file configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// File name used to derive default local and remote paths.
    #[serde(default = "default_database_name")]
    pub database_name: String,

    /// Explicit path of the local database file.
    #[serde(default)]
    pub local_path: Option<String>,

    /// Open sessions in WAL mode. When false the rollback journal is used
    /// and checkpoints are effectively no-ops.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,

    /// SQLite busy timeout applied to every connection, in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// Longest a new session waits for a paused gate before giving up, in seconds.
    #[serde(default = "default_session_wait_secs")]
    pub session_wait_secs: u64,
}

impl StorageConfig {
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    pub fn session_wait(&self) -> Duration {
        Duration::from_secs(self.session_wait_secs)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_name: default_database_name(),
            local_path: None,
            wal_mode: default_wal_mode(),
            busy_timeout_ms: default_busy_timeout_ms(),
            session_wait_secs: default_session_wait_secs(),
        }
    }
}

fn default_database_name() -> String {
    "litebook.db".to_string()
}

fn default_wal_mode() -> bool {
    true
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

fn default_session_wait_secs() -> u64 {
    30
}

/// Remote mirror and sync scheduling configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SyncConfig {
    /// Explicit path of the mirror on the durable mount.
    #[serde(default)]
    pub remote_path: Option<String>,

    /// Explicit path of the checksum baseline file.
    #[serde(default)]
    pub checksum_path: Option<String>,

    /// Explicit path of the scratch snapshot file.
    #[serde(default)]
    pub snapshot_path: Option<String>,

    /// Seconds between periodic syncs. `0` disables the scheduler.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Checkpoint mode used by the periodic scheduler.
    #[serde(default = "default_periodic_mode")]
    pub periodic_mode: CheckpointMode,

    /// Checkpoint mode used by the shutdown flush.
    #[serde(default = "default_final_mode")]
    pub final_mode: CheckpointMode,

    /// Pause new writers around the checkpoint.
    #[serde(default = "default_pause_writes")]
    pub pause_writes: bool,

    /// How long a pause waits for in-flight sessions to drain, in milliseconds.
    #[serde(default = "default_pause_timeout_ms")]
    pub pause_timeout_ms: u64,
}

impl SyncConfig {
    pub fn interval(&self) -> Option<Duration> {
        (self.interval_secs > 0).then(|| Duration::from_secs(self.interval_secs))
    }

    pub fn pause_timeout(&self) -> Duration {
        Duration::from_millis(self.pause_timeout_ms)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            remote_path: None,
            checksum_path: None,
            snapshot_path: None,
            interval_secs: default_interval_secs(),
            periodic_mode: default_periodic_mode(),
            final_mode: default_final_mode(),
            pause_writes: default_pause_writes(),
            pause_timeout_ms: default_pause_timeout_ms(),
        }
    }
}

fn default_interval_secs() -> u64 {
    600
}

fn default_periodic_mode() -> CheckpointMode {
    CheckpointMode::Passive
}

fn default_final_mode() -> CheckpointMode {
    CheckpointMode::Truncate
}

fn default_pause_writes() -> bool {
    true
}

fn default_pause_timeout_ms() -> u64 {
    1000
}

/// Process-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DaemonConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
