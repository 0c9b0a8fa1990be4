// SPDX-FileCopyrightText: 2026 Litebook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process lifecycle: hydrate on start, sync periodically, flush on stop.
//!
//! States only move forward: `starting -> running -> stopping -> stopped`.
//! Shutdown is cooperative. A signal cancels a token; a task spawned ahead
//! of time by [`LifecycleCoordinator::spawn_finalizer`] notices and runs the
//! final sync. [`ExitGuard`] covers exits that bypass that path.

use std::sync::Arc;

use litebook_config::model::{LitebookConfig, StorageConfig};
use litebook_core::{CheckpointMode, LifecycleState, LitebookError};
use litebook_storage::checksum::short;
use litebook_storage::{discard_sidecars, hash_file, initialize_file};
use serde::Serialize;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::scheduler::PeriodicSync;
use crate::snapshot::{SnapshotService, SyncOutcome};
use crate::status::StatusReport;

/// How startup obtained the local file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "path", rename_all = "snake_case")]
pub enum StartupPath {
    /// Restored from the mirror; the baseline was seeded with its hash.
    Hydrated { hash: String, bytes: u64 },
    /// No mirror existed; a fresh file was created and pushed if possible.
    Initialized { uploaded: bool },
}

struct Scheduler {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

pub struct LifecycleCoordinator {
    service: Arc<SnapshotService>,
    storage: StorageConfig,
    interval: Option<std::time::Duration>,
    periodic_mode: CheckpointMode,
    final_mode: CheckpointMode,
    state: watch::Sender<LifecycleState>,
    scheduler: Mutex<Option<Scheduler>>,
}

impl LifecycleCoordinator {
    pub fn new(config: &LitebookConfig, service: Arc<SnapshotService>) -> Self {
        let (state, _) = watch::channel(LifecycleState::Starting);
        Self {
            service,
            storage: config.storage.clone(),
            interval: config.sync.interval(),
            periodic_mode: config.sync.periodic_mode,
            final_mode: config.sync.final_mode,
            state,
            scheduler: Mutex::new(None),
        }
    }

    pub fn service(&self) -> &Arc<SnapshotService> {
        &self.service
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    /// Move to `next` if it is later than the current state.
    fn advance(&self, next: LifecycleState) -> bool {
        self.state.send_if_modified(|state| {
            if next > *state {
                debug!(from = %state, to = %next, "lifecycle transition");
                *state = next;
                true
            } else {
                false
            }
        })
    }

    /// Prepare the local file, start the scheduler and enter `running`.
    ///
    /// Fails only if the mirror exists but cannot be restored: serving an
    /// empty file in that case would overwrite the mirror on the next sync.
    pub async fn start(&self) -> Result<StartupPath, LitebookError> {
        if self.state() != LifecycleState::Starting {
            return Err(LitebookError::Internal(format!(
                "cannot start from state {}",
                self.state()
            )));
        }

        let path = self.hydrate().await?;

        if let Some(interval) = self.interval {
            let cancel = CancellationToken::new();
            let handle =
                PeriodicSync::new(Arc::clone(&self.service), interval, self.periodic_mode)
                    .spawn(cancel.clone());
            *self.scheduler.lock().await = Some(Scheduler { cancel, handle });
        } else {
            info!("periodic sync disabled");
        }

        self.advance(LifecycleState::Running);
        Ok(path)
    }

    async fn hydrate(&self) -> Result<StartupPath, LitebookError> {
        let mirror = self.service.mirror();
        let local = self.service.local_path().to_path_buf();
        let remote = mirror.stat().await?;

        if remote.exists {
            let bytes = mirror.pull(&local).await?;
            // Journal files from the previous owner of the local path belong
            // to the file just replaced.
            let hash = {
                let local = local.clone();
                litebook_storage::blocking(move || {
                    let discarded = discard_sidecars(&local)?;
                    if discarded > 0 {
                        warn!(path = %local.display(), discarded, "dropped stale journal files after restore");
                    }
                    hash_file(&local).map_err(|e| LitebookError::io("hash restored database", e))
                })
                .await?
            };
            self.service.checksum().save(&hash)?;
            info!(
                source = %mirror.location().display(),
                path = %local.display(),
                bytes,
                hash = %short(&hash),
                "local database restored from mirror"
            );
            return Ok(StartupPath::Hydrated { hash, bytes });
        }

        info!(
            mirror = %mirror.location().display(),
            "no mirror found, starting from a fresh database"
        );
        {
            let local = local.clone();
            let storage = self.storage.clone();
            litebook_storage::blocking(move || initialize_file(&local, &storage)).await?;
        }
        if let Err(e) = self
            .service
            .checkpointer()
            .checkpoint(CheckpointMode::Truncate)
            .await
        {
            warn!(error = %e, "initial checkpoint failed (non-fatal)");
        }

        let hash = {
            let local = local.clone();
            litebook_storage::blocking(move || {
                hash_file(&local).map_err(|e| LitebookError::io("hash new database", e))
            })
            .await?
        };
        match mirror.push(&local).await {
            Ok(bytes) => {
                self.service.checksum().save(&hash)?;
                info!(
                    destination = %mirror.location().display(),
                    bytes,
                    hash = %short(&hash),
                    "initial mirror created"
                );
                Ok(StartupPath::Initialized { uploaded: true })
            }
            Err(e) => {
                warn!(
                    error = %e,
                    "initial upload failed, continuing with local file only (non-fatal)"
                );
                Ok(StartupPath::Initialized { uploaded: false })
            }
        }
    }

    /// Stop the scheduler and run the final sync.
    ///
    /// Safe to call more than once and from several tasks: later calls wait
    /// for the first and report [`SyncOutcome::AlreadyFinalized`].
    pub async fn shutdown(&self) -> SyncOutcome {
        self.finish(true).await
    }

    async fn finish(&self, join_scheduler: bool) -> SyncOutcome {
        self.advance(LifecycleState::Stopping);

        if let Some(scheduler) = self.scheduler.lock().await.take() {
            scheduler.cancel.cancel();
            // The exit guard runs on its own runtime and must not wait on a
            // task owned by the runtime being torn down.
            if join_scheduler {
                if let Err(e) = scheduler.handle.await {
                    warn!(error = %e, "periodic sync task ended abnormally");
                }
            }
        }

        let outcome = self.service.sync_once(self.final_mode, true).await;
        match &outcome {
            SyncOutcome::Failed { reason } => warn!(reason = %reason, "final sync failed"),
            other => info!(outcome = %other, "final sync finished"),
        }
        self.advance(LifecycleState::Stopped);
        outcome
    }

    /// Spawn a task that runs [`LifecycleCoordinator::shutdown`] once
    /// `trigger` is cancelled.
    pub fn spawn_finalizer(
        self: &Arc<Self>,
        trigger: CancellationToken,
    ) -> JoinHandle<SyncOutcome> {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            trigger.cancelled().await;
            this.shutdown().await
        })
    }

    /// A guard that finalizes on drop if nothing else did.
    pub fn exit_guard(self: &Arc<Self>) -> ExitGuard {
        ExitGuard {
            coordinator: Some(Arc::clone(self)),
        }
    }

    /// Current file, baseline and lifecycle information.
    pub async fn status(&self) -> StatusReport {
        StatusReport::collect(&self.service, Some(self.state())).await
    }
}

/// Runs the final sync when dropped, unless it already happened.
///
/// The sync runs on a fresh single-threaded runtime in a dedicated thread,
/// so dropping the guard inside or outside a runtime is fine. Dropping
/// blocks until the sync finishes.
pub struct ExitGuard {
    coordinator: Option<Arc<LifecycleCoordinator>>,
}

impl ExitGuard {
    /// Disarm the guard without syncing.
    pub fn disarm(mut self) {
        self.coordinator = None;
    }
}

impl Drop for ExitGuard {
    fn drop(&mut self) {
        let Some(coordinator) = self.coordinator.take() else {
            return;
        };
        if coordinator.service().is_finalized() {
            return;
        }

        warn!("final sync did not run before exit, running it now");
        let worker = std::thread::spawn(move || {
            match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(rt) => {
                    rt.block_on(coordinator.finish(false));
                }
                Err(e) => warn!(error = %e, "could not build runtime for exit sync"),
            }
        });
        if worker.join().is_err() {
            warn!("exit sync thread panicked");
        }
    }
}
