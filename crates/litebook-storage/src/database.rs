// SPDX-FileCopyrightText: 2026 Litebook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Connection management for the local database file.
//!
//! All session work is serialized through tokio-rusqlite's single background
//! thread. Checkpoints use their own short-lived connection (see
//! [`crate::checkpoint`]); nothing else opens the file.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use litebook_config::model::StorageConfig;
use litebook_core::LitebookError;
use tracing::debug;

/// Convert a tokio-rusqlite error into LitebookError::Storage.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> LitebookError {
    LitebookError::Storage {
        source: Box::new(e),
    }
}

/// Pragmas applied to every connection, in order.
fn pragma_batch(wal_mode: bool) -> String {
    let journal = if wal_mode { "WAL" } else { "DELETE" };
    format!(
        "PRAGMA journal_mode={journal};
         PRAGMA synchronous=NORMAL;
         PRAGMA foreign_keys=ON;"
    )
}

/// Create the database file if needed and put it in the configured journal mode.
///
/// Used at startup when no mirror exists yet; the result is a valid, possibly
/// empty SQLite file ready to be checkpointed and pushed.
pub fn initialize_file(path: &Path, config: &StorageConfig) -> Result<(), LitebookError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| LitebookError::io("create local database directory", e))?;
    }
    let conn = rusqlite::Connection::open(path).map_err(|e| LitebookError::Storage {
        source: Box::new(e),
    })?;
    conn.busy_timeout(config.busy_timeout())
        .and_then(|_| conn.execute_batch(&pragma_batch(config.wal_mode)))
        .map_err(|e| LitebookError::Storage {
            source: Box::new(e),
        })?;
    debug!(path = %path.display(), wal_mode = config.wal_mode, "local database initialized");
    Ok(())
}

/// Journal files SQLite keeps next to a database, by suffix.
const SIDECAR_SUFFIXES: [&str; 3] = ["-wal", "-shm", "-journal"];

fn sidecar_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// Delete the WAL, shared-memory and rollback journal files left beside `path`.
///
/// Must only run while no connection has the database open. A replaced main
/// file would otherwise have the old frames replayed onto it on next open.
/// Returns how many files were removed.
pub fn discard_sidecars(path: &Path) -> Result<usize, LitebookError> {
    let mut removed = 0;
    for suffix in SIDECAR_SUFFIXES {
        let sidecar = sidecar_path(path, suffix);
        match std::fs::remove_file(&sidecar) {
            Ok(()) => {
                debug!(path = %sidecar.display(), "stale journal file removed");
                removed += 1;
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(LitebookError::io(format!("remove {}", sidecar.display()), e)),
        }
    }
    Ok(removed)
}

/// An open handle on the local database file.
pub struct Database {
    path: PathBuf,
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (creating if necessary) the database at `path` and apply pragmas.
    pub async fn open(path: &Path, config: &StorageConfig) -> Result<Self, LitebookError> {
        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| LitebookError::Storage {
                source: Box::new(e),
            })?;

        let busy_timeout = config.busy_timeout();
        let pragmas = pragma_batch(config.wal_mode);
        conn.call(move |conn| -> Result<(), rusqlite::Error> {
            conn.busy_timeout(busy_timeout)?;
            conn.execute_batch(&pragmas)?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        debug!(path = %path.display(), "database connection opened");
        Ok(Self {
            path: path.to_path_buf(),
            conn,
        })
    }

    /// The underlying tokio-rusqlite connection handle.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Close the connection, waiting for the background thread to finish.
    pub async fn close(self) -> Result<(), LitebookError> {
        let path = self.path;
        self.conn.close().await.map_err(map_tr_err)?;
        debug!(path = %path.display(), "database connection closed");
        Ok(())
    }
}
