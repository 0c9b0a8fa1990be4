// SPDX-FileCopyrightText: 2026 Litebook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Instrumented `MirrorStore` implementations.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use litebook_core::{FileStatus, LitebookError, MirrorStore};
use litebook_storage::FsMirror;
use tokio::time::Instant;

/// A filesystem mirror whose pushes sleep before copying.
pub struct SlowMirror {
    inner: FsMirror,
    delay: Duration,
    push_starts: Mutex<Vec<Instant>>,
}

impl SlowMirror {
    pub fn new(path: impl Into<PathBuf>, delay: Duration) -> Self {
        Self {
            inner: FsMirror::new(path),
            delay,
            push_starts: Mutex::new(Vec::new()),
        }
    }

    /// When each push began, before the delay.
    pub fn push_starts(&self) -> Vec<Instant> {
        self.push_starts.lock().expect("mirror lock poisoned").clone()
    }
}

#[async_trait]
impl MirrorStore for SlowMirror {
    fn location(&self) -> &Path {
        self.inner.location()
    }

    async fn stat(&self) -> Result<FileStatus, LitebookError> {
        self.inner.stat().await
    }

    async fn push(&self, src: &Path) -> Result<u64, LitebookError> {
        self.push_starts
            .lock()
            .expect("mirror lock poisoned")
            .push(Instant::now());
        tokio::time::sleep(self.delay).await;
        self.inner.push(src).await
    }

    async fn pull(&self, dst: &Path) -> Result<u64, LitebookError> {
        self.inner.pull(dst).await
    }
}

/// A mirror that reads normally but rejects every push.
pub struct FailingMirror {
    inner: FsMirror,
}

impl FailingMirror {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            inner: FsMirror::new(path),
        }
    }
}

#[async_trait]
impl MirrorStore for FailingMirror {
    fn location(&self) -> &Path {
        self.inner.location()
    }

    async fn stat(&self) -> Result<FileStatus, LitebookError> {
        self.inner.stat().await
    }

    async fn push(&self, _src: &Path) -> Result<u64, LitebookError> {
        Err(LitebookError::Upload {
            destination: self.inner.location().to_path_buf(),
            source: io::Error::other("simulated mount failure"),
        })
    }

    async fn pull(&self, dst: &Path) -> Result<u64, LitebookError> {
        self.inner.pull(dst).await
    }
}

/// Wraps another mirror and counts calls.
pub struct CountingMirror {
    inner: Arc<dyn MirrorStore>,
    pushes: AtomicUsize,
    pulls: AtomicUsize,
}

impl CountingMirror {
    pub fn new(inner: Arc<dyn MirrorStore>) -> Self {
        Self {
            inner,
            pushes: AtomicUsize::new(0),
            pulls: AtomicUsize::new(0),
        }
    }

    /// Count calls on a plain filesystem mirror at `path`.
    pub fn fs(path: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(FsMirror::new(path)))
    }

    pub fn pushes(&self) -> usize {
        self.pushes.load(Ordering::SeqCst)
    }

    pub fn pulls(&self) -> usize {
        self.pulls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MirrorStore for CountingMirror {
    fn location(&self) -> &Path {
        self.inner.location()
    }

    async fn stat(&self) -> Result<FileStatus, LitebookError> {
        self.inner.stat().await
    }

    async fn push(&self, src: &Path) -> Result<u64, LitebookError> {
        self.pushes.fetch_add(1, Ordering::SeqCst);
        self.inner.push(src).await
    }

    async fn pull(&self, dst: &Path) -> Result<u64, LitebookError> {
        self.pulls.fetch_add(1, Ordering::SeqCst);
        self.inner.pull(dst).await
    }
}
