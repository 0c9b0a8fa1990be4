// SPDX-FileCopyrightText: 2026 Litebook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits at the seams of the sync core.
//!
//! Both traits use `#[async_trait]` for dynamic dispatch compatibility, so
//! the snapshot service can hold them as `Arc<dyn ...>`.

pub mod hooks;
pub mod mirror;

pub use hooks::{NoopWriteHooks, WriteHooks};
pub use mirror::MirrorStore;
