// SPDX-FileCopyrightText: 2026 Litebook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Litebook integration tests.
//!
//! Provides on-disk fixtures and instrumented collaborators so sync behavior
//! can be observed without a real network mount.
//!
//! # Components
//!
//! - [`TestLayout`] - temp directory with a local dir, a mount dir and a matching config
//! - [`RecordingHooks`] - `WriteHooks` that timestamps every pause and resume
//! - [`SlowMirror`] - mirror whose pushes take a fixed extra delay
//! - [`FailingMirror`] - mirror whose pushes always fail
//! - [`CountingMirror`] - mirror wrapper counting pushes and pulls

pub mod hooks;
pub mod layout;
pub mod mirrors;

pub use hooks::{HookEvent, RecordingHooks};
pub use layout::TestLayout;
pub use mirrors::{CountingMirror, FailingMirror, SlowMirror};
