// SPDX-FileCopyrightText: 2026 Litebook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Temporary directory layout mirroring a deployment.
//!
//! ```text
//! <tmp>/local/app.db        local file (plus .sum and .snap neighbours)
//! <tmp>/mnt/app.db          remote mirror
//! ```

use std::path::{Path, PathBuf};

use litebook_config::model::LitebookConfig;
use litebook_storage::FsMirror;
use tempfile::TempDir;

const DB_NAME: &str = "app.db";

/// A throwaway deployment rooted in a temp directory.
///
/// The directory is removed when the layout is dropped.
pub struct TestLayout {
    dir: TempDir,
    config: LitebookConfig,
}

impl TestLayout {
    /// Layout with both the local directory and the mount present.
    pub fn new() -> Self {
        let layout = Self::without_mount();
        std::fs::create_dir_all(layout.mount_dir()).expect("create mount dir");
        layout
    }

    /// Layout whose mount directory does not exist.
    pub fn without_mount() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        std::fs::create_dir_all(dir.path().join("local")).expect("create local dir");

        let mut config = LitebookConfig::default();
        config.storage.database_name = DB_NAME.to_string();
        config.storage.local_path = Some(path_string(&dir.path().join("local").join(DB_NAME)));
        config.sync.remote_path = Some(path_string(&dir.path().join("mnt").join(DB_NAME)));
        config.sync.interval_secs = 0;
        config.sync.pause_timeout_ms = 200;

        Self { dir, config }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn config(&self) -> &LitebookConfig {
        &self.config
    }

    /// Mutable access for tests that tweak one setting.
    pub fn config_mut(&mut self) -> &mut LitebookConfig {
        &mut self.config
    }

    pub fn local_path(&self) -> PathBuf {
        self.config.local_path()
    }

    pub fn remote_path(&self) -> PathBuf {
        self.config.remote_path()
    }

    pub fn checksum_path(&self) -> PathBuf {
        self.config.checksum_path()
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.config.snapshot_path()
    }

    pub fn mount_dir(&self) -> PathBuf {
        self.dir.path().join("mnt")
    }

    /// A filesystem mirror at the layout's remote path.
    pub fn mirror(&self) -> FsMirror {
        FsMirror::new(self.remote_path())
    }

    /// Insert `count` rows into the local database, creating it if needed.
    ///
    /// Uses WAL mode so the new rows sit in the log until a checkpoint.
    pub fn write_rows(&self, count: usize) {
        let conn = rusqlite::Connection::open(self.local_path()).expect("open local db");
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             CREATE TABLE IF NOT EXISTS notes (id INTEGER PRIMARY KEY, body TEXT NOT NULL);",
        )
        .expect("prepare schema");
        for i in 0..count {
            conn.execute("INSERT INTO notes (body) VALUES (?1)", [format!("note {i}")])
                .expect("insert row");
        }
    }

    /// Number of rows in `notes` in the database file at `path`.
    pub fn count_rows(path: &Path) -> i64 {
        let conn = rusqlite::Connection::open(path).expect("open db");
        conn.query_row("SELECT COUNT(*) FROM notes", [], |row| row.get(0))
            .expect("count rows")
    }

    /// Stored baseline hash, if any.
    pub fn stored_checksum(&self) -> Option<String> {
        std::fs::read_to_string(self.checksum_path())
            .ok()
            .map(|s| s.trim().to_string())
    }
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

impl Default for TestLayout {
    fn default() -> Self {
        Self::new()
    }
}
