// SPDX-FileCopyrightText: 2026 Litebook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The serving layer's view of the local database.
//!
//! [`LocalStore`] owns the session connection and the [`WriteGate`], and
//! implements [`WriteHooks`] so the snapshot service can quiesce writers
//! around a checkpoint. Pausing closes the gate, waits for in-flight
//! sessions, then releases the connection; resuming rebuilds it and reopens
//! the gate.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use litebook_config::model::StorageConfig;
use litebook_core::{LitebookError, WriteHooks};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::database::Database;
use crate::gate::{GatePermit, WriteGate};

pub struct LocalStore {
    path: PathBuf,
    config: StorageConfig,
    gate: WriteGate,
    db: ArcSwapOption<Database>,
    rebuild_lock: Mutex<()>,
}

impl LocalStore {
    /// A store for the file at `path`. No connection is opened yet.
    pub fn new(path: impl Into<PathBuf>, config: StorageConfig) -> Self {
        Self {
            path: path.into(),
            config,
            gate: WriteGate::new(),
            db: ArcSwapOption::empty(),
            rebuild_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn gate(&self) -> &WriteGate {
        &self.gate
    }

    /// Whether a session connection is currently open.
    pub fn is_connected(&self) -> bool {
        self.db.load().is_some()
    }

    /// Open the session connection if it is not already open.
    pub async fn open(&self) -> Result<(), LitebookError> {
        let _guard = self.rebuild_lock.lock().await;
        if self.db.load().is_none() {
            self.connect().await?;
        }
        Ok(())
    }

    /// Replace the session connection with a fresh one.
    pub async fn rebuild(&self) -> Result<(), LitebookError> {
        let _guard = self.rebuild_lock.lock().await;
        if let Some(old) = self.db.swap(None) {
            close_if_unshared(old).await;
        }
        self.connect().await
    }

    /// Drop the session connection. Sessions still holding it keep it alive
    /// until they finish.
    pub async fn release(&self) {
        let _guard = self.rebuild_lock.lock().await;
        if let Some(old) = self.db.swap(None) {
            close_if_unshared(old).await;
            debug!(path = %self.path.display(), "session connection released");
        }
    }

    async fn connect(&self) -> Result<(), LitebookError> {
        let db = Database::open(&self.path, &self.config).await?;
        self.db.store(Some(Arc::new(db)));
        Ok(())
    }

    /// Admit a new session through the write gate.
    ///
    /// Waits at most `session_wait_secs` for a paused gate to reopen. Rebuilds
    /// the connection if a pause left it released.
    pub async fn acquire_session(&self) -> Result<Session, LitebookError> {
        let permit = self.gate.acquire_timeout(self.config.session_wait()).await?;
        let db = match self.db.load_full() {
            Some(db) => db,
            None => {
                self.open().await?;
                self.db.load_full().ok_or_else(|| {
                    LitebookError::Internal("session connection vanished after open".into())
                })?
            }
        };
        Ok(Session {
            db,
            _permit: permit,
        })
    }

    /// Close the gate and the connection for good.
    pub async fn close(&self) {
        self.gate.pause(Duration::ZERO).await;
        self.release().await;
    }
}

async fn close_if_unshared(db: Arc<Database>) {
    match Arc::try_unwrap(db) {
        Ok(db) => {
            if let Err(e) = db.close().await {
                warn!(error = %e, "closing session connection failed (non-fatal)");
            }
        }
        // A straggler still holds it; its last clone closes on drop.
        Err(_) => debug!("session connection still shared, deferring close"),
    }
}

#[async_trait]
impl WriteHooks for LocalStore {
    async fn pause_writes(&self, timeout: Duration) -> Result<(), LitebookError> {
        if !self.gate.pause(timeout).await {
            warn!(
                in_flight = self.gate.in_flight(),
                "proceeding with checkpoint while sessions are still active"
            );
        }
        self.release().await;
        Ok(())
    }

    async fn resume_writes(&self) -> Result<(), LitebookError> {
        let rebuilt = self.rebuild().await;
        self.gate.resume();
        match &rebuilt {
            Ok(()) => info!(path = %self.path.display(), "writes resumed"),
            Err(e) => warn!(error = %e, "writes resumed without a fresh connection"),
        }
        rebuilt
    }
}

/// A database session admitted through the write gate.
///
/// Holding a `Session` counts as in flight for [`WriteGate::pause`].
pub struct Session {
    db: Arc<Database>,
    _permit: GatePermit,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Session")
    }
}

impl Session {
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        self.db.connection()
    }
}
