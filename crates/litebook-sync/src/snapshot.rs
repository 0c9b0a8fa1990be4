// SPDX-FileCopyrightText: 2026 Litebook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One sync attempt: checkpoint, snapshot, hash, and upload only on change.
//!
//! Attempts are serialized by a single async mutex held for the whole
//! attempt, so a periodic sync and the final flush can never interleave.
//! [`SnapshotService::sync_once`] never returns an error; every failure is
//! logged and folded into the returned [`SyncOutcome`].

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use litebook_config::model::LitebookConfig;
use litebook_core::{CheckpointMode, LitebookError, MirrorStore, NoopWriteHooks, WriteHooks};
use litebook_storage::checksum::short;
use litebook_storage::{Checkpointer, ChecksumStore, hash_file};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// What a call to [`SnapshotService::sync_once`] did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// The mirror was replaced and the baseline now holds `hash`.
    Uploaded { hash: String, bytes: u64 },
    /// Content matched the baseline; nothing was written.
    Unchanged { hash: String },
    /// There was no local database file to sync.
    NoLocalFile,
    /// A finalize was requested after one had already succeeded.
    AlreadyFinalized,
    /// The attempt failed; the baseline was left untouched.
    Failed { reason: String },
}

impl SyncOutcome {
    /// Whether the mirror was written.
    pub fn did_upload(&self) -> bool {
        matches!(self, Self::Uploaded { .. })
    }

    /// The mirror is known to match the local file after this attempt.
    pub fn is_synced(&self) -> bool {
        matches!(
            self,
            Self::Uploaded { .. } | Self::Unchanged { .. } | Self::AlreadyFinalized
        )
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

impl std::fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uploaded { hash, bytes } => {
                write!(f, "uploaded {bytes} bytes ({})", short(hash))
            }
            Self::Unchanged { hash } => write!(f, "unchanged ({})", short(hash)),
            Self::NoLocalFile => f.write_str("nothing to sync: no local database"),
            Self::AlreadyFinalized => f.write_str("skipped: already finalized"),
            Self::Failed { reason } => write!(f, "failed: {reason}"),
        }
    }
}

/// Removes the snapshot file when the attempt ends, however it ends.
struct ScratchFile {
    path: PathBuf,
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => {
                warn!(path = %self.path.display(), error = %e, "could not remove snapshot file");
            }
            _ => {}
        }
    }
}

pub struct SnapshotService {
    local_path: PathBuf,
    snapshot_path: PathBuf,
    checksum: ChecksumStore,
    checkpointer: Checkpointer,
    mirror: Arc<dyn MirrorStore>,
    hooks: Arc<dyn WriteHooks>,
    pause_writes: bool,
    pause_timeout: Duration,
    attempt_lock: Mutex<()>,
    finalized: AtomicBool,
}

impl SnapshotService {
    /// A service for the paths in `config`, uploading to `mirror`.
    ///
    /// No write hooks are registered; see [`SnapshotService::with_hooks`].
    pub fn new(config: &LitebookConfig, mirror: Arc<dyn MirrorStore>) -> Self {
        let local_path = config.local_path();
        Self {
            checkpointer: Checkpointer::new(&local_path, config.storage.busy_timeout()),
            checksum: ChecksumStore::new(config.checksum_path()),
            snapshot_path: config.snapshot_path(),
            local_path,
            mirror,
            hooks: Arc::new(NoopWriteHooks),
            pause_writes: config.sync.pause_writes,
            pause_timeout: config.sync.pause_timeout(),
            attempt_lock: Mutex::new(()),
            finalized: AtomicBool::new(false),
        }
    }

    /// Register the serving layer's pause/resume hooks.
    pub fn with_hooks(mut self, hooks: Arc<dyn WriteHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn local_path(&self) -> &Path {
        &self.local_path
    }

    pub fn mirror(&self) -> &Arc<dyn MirrorStore> {
        &self.mirror
    }

    pub fn checksum(&self) -> &ChecksumStore {
        &self.checksum
    }

    pub fn checkpointer(&self) -> &Checkpointer {
        &self.checkpointer
    }

    /// Whether a finalize attempt has completed successfully.
    pub fn is_finalized(&self) -> bool {
        self.finalized.load(Ordering::SeqCst)
    }

    /// Run one sync attempt.
    ///
    /// With `finalize`, the attempt is skipped if a previous finalize already
    /// succeeded, and a successful attempt latches the finalized flag.
    pub async fn sync_once(&self, mode: CheckpointMode, finalize: bool) -> SyncOutcome {
        let _attempt = self.attempt_lock.lock().await;

        if finalize && self.is_finalized() {
            debug!("final sync already done, skipping");
            return SyncOutcome::AlreadyFinalized;
        }

        let started = Instant::now();
        let outcome = match self.attempt(mode).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(
                    path = %self.local_path.display(),
                    %mode,
                    error = %e,
                    "sync attempt failed"
                );
                SyncOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        };

        let succeeded = matches!(
            outcome,
            SyncOutcome::Uploaded { .. } | SyncOutcome::Unchanged { .. }
        );
        if finalize && succeeded {
            self.finalized.store(true, Ordering::SeqCst);
            info!(
                elapsed_ms = started.elapsed().as_millis() as u64,
                "final sync complete"
            );
        }
        outcome
    }

    async fn attempt(&self, mode: CheckpointMode) -> Result<SyncOutcome, LitebookError> {
        if !self.local_path.exists() {
            debug!(path = %self.local_path.display(), "no local database, nothing to sync");
            return Ok(SyncOutcome::NoLocalFile);
        }

        self.checkpoint_paused(mode).await;

        // Removed on drop, including when the attempt is cancelled mid-upload.
        let scratch = ScratchFile {
            path: self.snapshot_path.clone(),
        };
        self.snapshot_and_upload(&scratch).await
    }

    /// Checkpoint with writers paused around it. Failures are logged only.
    async fn checkpoint_paused(&self, mode: CheckpointMode) {
        let paused = self.pause_writes;
        if paused {
            if let Err(e) = self.hooks.pause_writes(self.pause_timeout).await {
                warn!(error = %e, "pausing writers failed, checkpointing anyway (non-fatal)");
            }
        }

        let result = self.checkpointer.checkpoint(mode).await;

        if paused {
            if let Err(e) = self.hooks.resume_writes().await {
                warn!(error = %e, "resuming writers reported an error (non-fatal)");
            }
        }

        if let Err(e) = result {
            warn!(error = %e, "checkpoint failed, syncing current file content (non-fatal)");
        }
    }

    async fn snapshot_and_upload(
        &self,
        scratch: &ScratchFile,
    ) -> Result<SyncOutcome, LitebookError> {
        let src = self.local_path.clone();
        let snap = scratch.path.clone();
        let hash = litebook_storage::blocking(move || {
            std::fs::copy(&src, &snap).map_err(|e| LitebookError::io("copy snapshot", e))?;
            hash_file(&snap).map_err(|e| LitebookError::io("hash snapshot", e))
        })
        .await?;

        let baseline = self.checksum.load();
        if baseline.as_deref() == Some(hash.as_str()) {
            debug!(hash = %short(&hash), "content unchanged since last upload, skipping");
            return Ok(SyncOutcome::Unchanged { hash });
        }

        let started = Instant::now();
        let bytes = self.mirror.push(&scratch.path).await?;
        self.checksum.save(&hash)?;
        info!(
            destination = %self.mirror.location().display(),
            hash = %short(&hash),
            previous = %baseline.as_deref().map(short).unwrap_or("none"),
            bytes,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "snapshot uploaded"
        );
        Ok(SyncOutcome::Uploaded { hash, bytes })
    }
}
