// SPDX-FileCopyrightText: 2026 Litebook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Litebook persistence-synchronization core.
//!
//! This crate provides the error type, the shared value types, and the two
//! collaborator traits ([`WriteHooks`] and [`MirrorStore`]) that the storage
//! and sync crates meet at.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::LitebookError;
pub use traits::{MirrorStore, NoopWriteHooks, WriteHooks};
pub use types::{CheckpointMode, FileStatus, LifecycleState};
