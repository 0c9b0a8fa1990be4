// SPDX-FileCopyrightText: 2026 Litebook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `litebook sync` command implementation: one attempt, then exit.
//!
//! No serving layer runs in this process, so no writers are paused.

use std::sync::Arc;

use litebook_config::model::LitebookConfig;
use litebook_core::{CheckpointMode, LitebookError};
use litebook_storage::FsMirror;
use litebook_sync::{SnapshotService, SyncOutcome};

pub async fn run_sync(
    config: &LitebookConfig,
    mode: Option<CheckpointMode>,
    finalize: bool,
    json: bool,
) -> Result<(), LitebookError> {
    let mode = mode.unwrap_or(if finalize {
        config.sync.final_mode
    } else {
        config.sync.periodic_mode
    });
    let service = SnapshotService::new(config, Arc::new(FsMirror::new(config.remote_path())));
    let outcome = service.sync_once(mode, finalize).await;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&outcome).unwrap_or_else(|_| "{}".to_string())
        );
    } else {
        println!("litebook sync ({mode}): {outcome}");
    }

    match outcome {
        SyncOutcome::Failed { reason } => Err(LitebookError::Internal(reason)),
        _ => Ok(()),
    }
}
