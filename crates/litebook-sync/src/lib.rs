// SPDX-FileCopyrightText: 2026 Litebook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sync orchestration for the Litebook persistence core.
//!
//! - [`SnapshotService`] runs one checkpoint/snapshot/upload attempt.
//! - [`PeriodicSync`] runs attempts on an interval.
//! - [`LifecycleCoordinator`] hydrates at startup and flushes at shutdown.

pub mod lifecycle;
pub mod scheduler;
pub mod shutdown;
pub mod snapshot;
pub mod status;

pub use lifecycle::{ExitGuard, LifecycleCoordinator, StartupPath};
pub use scheduler::PeriodicSync;
pub use shutdown::install_signal_handler;
pub use snapshot::{SnapshotService, SyncOutcome};
pub use status::StatusReport;
