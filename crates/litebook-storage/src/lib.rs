// SPDX-FileCopyrightText: 2026 Litebook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Local-file mechanics for the Litebook sync core.
//!
//! Everything here operates on one SQLite file and its neighbours: WAL
//! checkpointing, atomic copies, the checksum record, the session connection
//! and the write gate in front of it. Policy (when to sync, what to upload)
//! lives in `litebook-sync`.

pub mod checkpoint;
pub mod checksum;
pub mod copier;
pub mod database;
pub mod gate;
pub mod mirror;
pub mod store;

pub use checkpoint::{CheckpointReport, Checkpointer};
pub use checksum::{ChecksumStore, hash_file};
pub use copier::copy_atomic;
pub use database::{Database, discard_sidecars, initialize_file};
pub use gate::{GatePermit, WriteGate};
pub use mirror::FsMirror;
pub use store::{LocalStore, Session};

use litebook_core::LitebookError;

/// Run blocking file or SQLite work on tokio's blocking pool.
pub async fn blocking<F, T>(f: F) -> Result<T, LitebookError>
where
    F: FnOnce() -> Result<T, LitebookError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| LitebookError::Internal(format!("blocking task failed: {e}")))?
}
