// SPDX-FileCopyrightText: 2026 Litebook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable remote mirror of the database file.

use std::path::Path;

use async_trait::async_trait;

use crate::error::LitebookError;
use crate::types::FileStatus;

/// Destination that holds the most recent durable copy of the database.
///
/// Implementations must make `push` atomic from a reader's point of view:
/// the mirror holds either the previous content or the new content, never a
/// partial write.
#[async_trait]
pub trait MirrorStore: Send + Sync + 'static {
    /// Where the mirror lives, for logging and status output.
    fn location(&self) -> &Path;

    /// Whether the mirror currently exists and how large it is.
    async fn stat(&self) -> Result<FileStatus, LitebookError>;

    /// Replace the mirror with the content of `src`. Returns bytes written.
    async fn push(&self, src: &Path) -> Result<u64, LitebookError>;

    /// Copy the mirror to `dst` atomically. Returns bytes written.
    async fn pull(&self, dst: &Path) -> Result<u64, LitebookError>;
}
