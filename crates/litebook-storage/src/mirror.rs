// SPDX-FileCopyrightText: 2026 Litebook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mirror backed by a file on a mounted filesystem (e.g. a gcsfuse mount).

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use litebook_core::{FileStatus, LitebookError, MirrorStore};
use tracing::debug;

use crate::copier;

/// A mirror file living under a mount point.
///
/// The mount directory is never created here: an absent mount means the
/// durable volume is not attached, and writing into a fresh local directory
/// in its place would silently lose data.
#[derive(Debug, Clone)]
pub struct FsMirror {
    path: PathBuf,
}

impl FsMirror {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn mount_dir(&self) -> &Path {
        match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        }
    }

    fn check_mount(&self) -> Result<(), LitebookError> {
        if self.mount_dir().is_dir() {
            Ok(())
        } else {
            Err(LitebookError::MissingRemoteMount {
                path: self.mount_dir().to_path_buf(),
            })
        }
    }
}

#[async_trait]
impl MirrorStore for FsMirror {
    fn location(&self) -> &Path {
        &self.path
    }

    async fn stat(&self) -> Result<FileStatus, LitebookError> {
        let path = self.path.clone();
        crate::blocking(move || Ok(FileStatus::probe(&path))).await
    }

    async fn push(&self, src: &Path) -> Result<u64, LitebookError> {
        self.check_mount()?;
        let src = src.to_path_buf();
        let dst = self.path.clone();
        let bytes = crate::blocking(move || {
            copier::copy_atomic(&src, &dst).map_err(|source| LitebookError::Upload {
                destination: dst.clone(),
                source,
            })
        })
        .await?;
        debug!(destination = %self.path.display(), bytes, "mirror replaced");
        Ok(bytes)
    }

    async fn pull(&self, dst: &Path) -> Result<u64, LitebookError> {
        let src = self.path.clone();
        let dst = dst.to_path_buf();
        crate::blocking(move || {
            if let Some(parent) = dst.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .map_err(|e| LitebookError::io("create local database directory", e))?;
            }
            copier::copy_atomic(&src, &dst).map_err(|e| {
                let context = if e.kind() == io::ErrorKind::NotFound {
                    format!("mirror {} not readable", src.display())
                } else {
                    format!("restore from {}", src.display())
                };
                LitebookError::io(context, e)
            })
        })
        .await
    }
}
