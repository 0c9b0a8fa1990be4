// SPDX-FileCopyrightText: 2026 Litebook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Background task running a sync every interval.

use std::sync::Arc;
use std::time::Duration;

use litebook_core::CheckpointMode;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::snapshot::{SnapshotService, SyncOutcome};

/// Periodic, non-finalizing syncs until cancelled.
///
/// The first sync happens one full interval after the task starts. A sync
/// already in progress when the token is cancelled runs to completion.
pub struct PeriodicSync {
    service: Arc<SnapshotService>,
    interval: Duration,
    mode: CheckpointMode,
}

impl PeriodicSync {
    pub fn new(service: Arc<SnapshotService>, interval: Duration, mode: CheckpointMode) -> Self {
        Self {
            service,
            interval,
            mode,
        }
    }

    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }

    pub async fn run(self, cancel: CancellationToken) {
        info!(
            interval_secs = self.interval.as_secs_f64(),
            mode = %self.mode,
            "periodic sync started"
        );
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // Skip the first immediate tick.
        ticker.tick().await;

        loop {
            if cancel.is_cancelled() {
                break;
            }
            tokio::select! {
                _ = ticker.tick() => {}
                _ = cancel.cancelled() => break,
            }
            if cancel.is_cancelled() {
                break;
            }

            match self.service.sync_once(self.mode, false).await {
                SyncOutcome::Uploaded { bytes, .. } => {
                    debug!(bytes, "periodic sync uploaded a new snapshot");
                }
                SyncOutcome::Failed { reason } => {
                    warn!(reason = %reason, "periodic sync failed (non-fatal)");
                }
                other => debug!(outcome = %other, "periodic sync finished"),
            }
        }
        info!("periodic sync stopped");
    }
}
