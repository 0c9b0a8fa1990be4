// SPDX-FileCopyrightText: 2026 Litebook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pause/resume hooks the serving layer may register.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::LitebookError;

/// Capability to briefly stop new writers while a checkpoint runs.
///
/// `pause_writes` is best-effort: it may return once `timeout` elapses even if
/// some sessions are still in flight. `resume_writes` must reopen
/// unconditionally and is called even when the checkpoint failed.
#[async_trait]
pub trait WriteHooks: Send + Sync + 'static {
    /// Stop admitting new sessions and wait up to `timeout` for in-flight ones.
    async fn pause_writes(&self, timeout: Duration) -> Result<(), LitebookError>;

    /// Admit new sessions again.
    async fn resume_writes(&self) -> Result<(), LitebookError>;
}

/// Hooks used when no serving layer registered any: checkpoints proceed
/// without pausing anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopWriteHooks;

#[async_trait]
impl WriteHooks for NoopWriteHooks {
    async fn pause_writes(&self, _timeout: Duration) -> Result<(), LitebookError> {
        Ok(())
    }

    async fn resume_writes(&self) -> Result<(), LitebookError> {
        Ok(())
    }
}
