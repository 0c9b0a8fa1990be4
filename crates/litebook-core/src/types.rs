// SPDX-FileCopyrightText: 2026 Litebook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the storage and sync crates.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Strength of a WAL checkpoint, weakest first.
///
/// The derived ordering follows declaration order, so
/// `CheckpointMode::Passive < CheckpointMode::Truncate`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum CheckpointMode {
    /// Merge as many frames as possible without waiting on readers or writers.
    Passive,
    /// Block new writers until the whole log is merged.
    Full,
    /// Like `Full`, then wait for readers so the next writer restarts the log.
    Restart,
    /// Like `Restart`, then truncate the log file to zero bytes.
    Truncate,
}

impl CheckpointMode {
    /// The argument accepted by `PRAGMA wal_checkpoint(...)`.
    pub fn as_pragma(self) -> &'static str {
        match self {
            Self::Passive => "PASSIVE",
            Self::Full => "FULL",
            Self::Restart => "RESTART",
            Self::Truncate => "TRUNCATE",
        }
    }

    /// Whether this mode waits for the merge to finish.
    pub fn is_blocking(self) -> bool {
        self > Self::Passive
    }
}

/// Existence and size of a file, as reported by the status query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStatus {
    pub path: PathBuf,
    pub exists: bool,
    pub size: u64,
}

impl FileStatus {
    /// Stat `path`. Anything other than a readable regular file reports as absent.
    pub fn probe(path: &Path) -> Self {
        match std::fs::metadata(path) {
            Ok(meta) if meta.is_file() => Self {
                path: path.to_path_buf(),
                exists: true,
                size: meta.len(),
            },
            _ => Self {
                path: path.to_path_buf(),
                exists: false,
                size: 0,
            },
        }
    }
}

/// Lifecycle of the sync core inside a serving process.
///
/// Transitions are linear: `Starting -> Running -> Stopping -> Stopped`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    Starting,
    Running,
    Stopping,
    Stopped,
}
