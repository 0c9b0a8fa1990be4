// SPDX-FileCopyrightText: 2026 Litebook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-only view of the local file, the mirror and the sync baseline.

use chrono::{DateTime, Utc};
use litebook_core::{FileStatus, LifecycleState};
use serde::Serialize;
use tracing::debug;

use crate::snapshot::SnapshotService;

/// Snapshot of sync health.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    /// Both the local file and the mirror are present.
    pub ok: bool,
    pub local: FileStatus,
    pub remote: FileStatus,
    /// Hash of the content last uploaded, if any.
    pub checksum: Option<String>,
    /// When that hash was recorded.
    pub checksum_recorded_at: Option<DateTime<Utc>>,
    pub finalized: bool,
    /// Lifecycle state, when queried inside a running process.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<LifecycleState>,
}

impl StatusReport {
    pub async fn collect(service: &SnapshotService, state: Option<LifecycleState>) -> Self {
        let local = FileStatus::probe(service.local_path());
        let remote = match service.mirror().stat().await {
            Ok(status) => status,
            Err(e) => {
                debug!(error = %e, "mirror stat failed, reporting it as absent");
                FileStatus {
                    path: service.mirror().location().to_path_buf(),
                    exists: false,
                    size: 0,
                }
            }
        };

        Self {
            ok: local.exists && remote.exists,
            local,
            remote,
            checksum: service.checksum().load(),
            checksum_recorded_at: service.checksum().recorded_at(),
            finalized: service.is_finalized(),
            state,
        }
    }
}
