// SPDX-FileCopyrightText: 2026 Litebook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Litebook persistence-synchronization core.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::CheckpointMode;

/// The primary error type used across the storage and sync crates.
#[derive(Debug, Error)]
pub enum LitebookError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// SQLite errors raised while opening or driving the local database.
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Filesystem errors outside of the upload path.
    #[error("{context}: {source}")]
    Io {
        context: String,
        source: std::io::Error,
    },

    /// The durable mount is absent or is not a directory.
    #[error("remote mount not available: {}", path.display())]
    MissingRemoteMount { path: PathBuf },

    /// A sync was attempted before the local database file existed.
    #[error("local database not found: {}", path.display())]
    MissingLocalFile { path: PathBuf },

    /// The WAL could not be merged into the main database file.
    #[error("checkpoint ({mode}) failed: {source}")]
    Checkpoint {
        mode: CheckpointMode,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Copying the snapshot to the remote mirror failed.
    #[error("upload to {} failed: {source}", destination.display())]
    Upload {
        destination: PathBuf,
        source: std::io::Error,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl LitebookError {
    /// Wraps an I/O error with a short description of what was being attempted.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}
