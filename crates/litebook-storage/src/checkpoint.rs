// SPDX-FileCopyrightText: 2026 Litebook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WAL checkpointing on a dedicated short-lived connection.
//!
//! The checkpoint connection is opened per call so it never competes with
//! the session connection's statement cache or transaction state. It opens
//! the file read-write without `CREATE`: checkpointing a file that does not
//! exist is an error, not an empty database.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use litebook_core::{CheckpointMode, LitebookError};
use rusqlite::{Connection, OpenFlags};
use tracing::{debug, warn};

/// Result row of `PRAGMA wal_checkpoint`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckpointReport {
    pub mode: CheckpointMode,
    /// The merge could not finish because of a concurrent reader or writer.
    pub busy: bool,
    /// Frames in the WAL, or -1 when the database is not in WAL mode.
    pub log_frames: i64,
    /// Frames copied back into the main file, or -1 when not in WAL mode.
    pub checkpointed_frames: i64,
    pub elapsed: Duration,
}

impl CheckpointReport {
    /// Every frame in the log made it into the main file.
    pub fn is_complete(&self) -> bool {
        !self.busy && self.log_frames == self.checkpointed_frames
    }
}

/// Merges the write-ahead log of one database file into its main file.
#[derive(Debug, Clone)]
pub struct Checkpointer {
    path: PathBuf,
    busy_timeout: Duration,
}

impl Checkpointer {
    pub fn new(path: impl Into<PathBuf>, busy_timeout: Duration) -> Self {
        Self {
            path: path.into(),
            busy_timeout,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run the checkpoint on the blocking pool.
    pub async fn checkpoint(&self, mode: CheckpointMode) -> Result<CheckpointReport, LitebookError> {
        let this = self.clone();
        crate::blocking(move || this.checkpoint_blocking(mode)).await
    }

    /// Run the checkpoint on the calling thread. May block for the whole merge.
    pub fn checkpoint_blocking(
        &self,
        mode: CheckpointMode,
    ) -> Result<CheckpointReport, LitebookError> {
        let started = Instant::now();
        let wrap = |e: rusqlite::Error| LitebookError::Checkpoint {
            mode,
            source: Box::new(e),
        };

        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(wrap)?;
        conn.busy_timeout(self.busy_timeout).map_err(wrap)?;

        let (busy, log_frames, checkpointed_frames) = conn
            .query_row(
                &format!("PRAGMA wal_checkpoint({});", mode.as_pragma()),
                [],
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?, row.get::<_, i64>(2)?)),
            )
            .map_err(wrap)?;
        drop(conn);

        let report = CheckpointReport {
            mode,
            busy: busy != 0,
            log_frames,
            checkpointed_frames,
            elapsed: started.elapsed(),
        };

        if report.busy && mode.is_blocking() {
            warn!(
                path = %self.path.display(),
                %mode,
                log_frames,
                checkpointed_frames,
                "checkpoint incomplete: database busy"
            );
        } else {
            debug!(
                path = %self.path.display(),
                %mode,
                log_frames,
                checkpointed_frames,
                elapsed_ms = report.elapsed.as_millis() as u64,
                "checkpoint complete"
            );
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use tracing_test::traced_test;

    fn wal_db(path: &Path) -> Connection {
        let conn = Connection::open(path).unwrap();
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA wal_autocheckpoint=0;
             CREATE TABLE articles (id INTEGER PRIMARY KEY, title TEXT);
             INSERT INTO articles (title) VALUES ('first'), ('second');",
        )
        .unwrap();
        conn
    }

    fn wal_len(db: &Path) -> u64 {
        let mut wal = db.as_os_str().to_owned();
        wal.push("-wal");
        std::fs::metadata(PathBuf::from(wal)).map(|m| m.len()).unwrap_or(0)
    }

    #[test]
    fn truncate_empties_the_wal() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("litebook.db");
        let writer = wal_db(&path);
        assert!(wal_len(&path) > 0);

        let report = Checkpointer::new(&path, Duration::from_secs(1))
            .checkpoint_blocking(CheckpointMode::Truncate)
            .unwrap();
        assert!(report.is_complete());
        assert_eq!(wal_len(&path), 0);
        drop(writer);
    }

    #[test]
    fn checkpointed_main_file_is_self_contained() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("litebook.db");
        let writer = wal_db(&path);

        Checkpointer::new(&path, Duration::from_secs(1))
            .checkpoint_blocking(CheckpointMode::Full)
            .unwrap();

        // Copy only the main file, as the snapshot does.
        let copy = dir.path().join("copy.db");
        std::fs::copy(&path, &copy).unwrap();
        let reader = Connection::open(&copy).unwrap();
        let count: i64 = reader
            .query_row("SELECT COUNT(*) FROM articles", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 2);
        drop(writer);
    }

    #[test]
    #[traced_test]
    fn open_reader_makes_truncate_report_busy() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("litebook.db");
        let writer = wal_db(&path);

        // A read transaction pins the WAL at its current end.
        let reader = Connection::open(&path).unwrap();
        reader.execute_batch("BEGIN;").unwrap();
        let _: i64 = reader
            .query_row("SELECT COUNT(*) FROM articles", [], |row| row.get(0))
            .unwrap();
        writer
            .execute("INSERT INTO articles (title) VALUES ('third')", [])
            .unwrap();

        let report = Checkpointer::new(&path, Duration::from_millis(50))
            .checkpoint_blocking(CheckpointMode::Truncate)
            .unwrap();
        assert!(report.busy);
        assert!(!report.is_complete());
        assert!(logs_contain("checkpoint incomplete"));

        reader.execute_batch("COMMIT;").unwrap();
        drop(writer);
    }

    #[test]
    fn passive_on_rollback_journal_is_a_noop() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plain.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch("CREATE TABLE t (x INTEGER);").unwrap();
        drop(conn);

        let report = Checkpointer::new(&path, Duration::from_secs(1))
            .checkpoint_blocking(CheckpointMode::Passive)
            .unwrap();
        assert!(!report.busy);
        assert_eq!(report.log_frames, -1);
        assert!(report.is_complete());
    }

    #[test]
    fn missing_database_is_a_checkpoint_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.db");
        let err = Checkpointer::new(&path, Duration::from_millis(10))
            .checkpoint_blocking(CheckpointMode::Full)
            .unwrap_err();
        assert!(matches!(
            err,
            LitebookError::Checkpoint {
                mode: CheckpointMode::Full,
                ..
            }
        ));
        assert!(!path.exists(), "checkpoint must not create the file");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn async_checkpoint_runs_on_blocking_pool() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("litebook.db");
        let writer = wal_db(&path);
        let report = Checkpointer::new(&path, Duration::from_secs(1))
            .checkpoint(CheckpointMode::Restart)
            .await
            .unwrap();
        assert_eq!(report.mode, CheckpointMode::Restart);
        assert!(!report.busy);
        drop(writer);
    }
}
