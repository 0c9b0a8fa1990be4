// SPDX-FileCopyrightText: 2026 Litebook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `litebook serve` command implementation.
//!
//! Startup order: hydrate the local file, open the session store, start the
//! scheduler, install signal handling. The process then idles until a signal
//! arrives and the pre-spawned finalizer has flushed to the mirror.

use std::sync::Arc;

use litebook_config::model::LitebookConfig;
use litebook_core::{LitebookError, MirrorStore};
use litebook_storage::{FsMirror, LocalStore};
use litebook_sync::{
    LifecycleCoordinator, SnapshotService, StartupPath, SyncOutcome, install_signal_handler,
};
use tracing::{info, warn};

pub async fn run_serve(config: LitebookConfig) -> Result<(), LitebookError> {
    let store = Arc::new(LocalStore::new(config.local_path(), config.storage.clone()));
    let mirror: Arc<dyn MirrorStore> = Arc::new(FsMirror::new(config.remote_path()));
    let service = Arc::new(SnapshotService::new(&config, mirror).with_hooks(store.clone()));
    let coordinator = Arc::new(LifecycleCoordinator::new(&config, service));

    // A failed restore must not be followed by a flush of whatever is local.
    match coordinator.start().await? {
        StartupPath::Hydrated { bytes, .. } => info!(bytes, "restored from mirror"),
        StartupPath::Initialized { uploaded } => info!(uploaded, "started with a fresh database"),
    }
    let guard = coordinator.exit_guard();

    store.open().await?;

    let cancel = install_signal_handler();
    let finalizer = coordinator.spawn_finalizer(cancel);
    info!(
        local = %config.local_path().display(),
        remote = %config.remote_path().display(),
        interval_secs = config.sync.interval_secs,
        "litebook serving"
    );

    let outcome = finalizer
        .await
        .map_err(|e| LitebookError::Internal(format!("finalizer task failed: {e}")))?;
    store.close().await;

    match outcome {
        SyncOutcome::Failed { reason } => {
            // The guard retries once on drop.
            warn!(reason = %reason, "final sync failed");
            drop(guard);
            if coordinator.service().is_finalized() {
                Ok(())
            } else {
                Err(LitebookError::Internal(format!("final sync failed: {reason}")))
            }
        }
        other => {
            info!(outcome = %other, "shutdown complete");
            guard.disarm();
            Ok(())
        }
    }
}
