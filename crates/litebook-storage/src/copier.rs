// SPDX-FileCopyrightText: 2026 Litebook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Atomic file replacement via a temporary sibling and a rename.
//!
//! The temporary file lives in the destination's directory so the final
//! rename never crosses a filesystem boundary. Until [`StagedCopy::commit`]
//! runs, the destination keeps its previous content; if the process dies
//! first, the temporary file is orphaned and the destination is untouched.
//! Timestamps and permissions are not carried over.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

/// A fully written, fsynced copy waiting to be renamed into place.
///
/// Dropping a `StagedCopy` without committing removes the temporary file.
#[derive(Debug)]
pub struct StagedCopy {
    temp: NamedTempFile,
    dst: PathBuf,
    bytes: u64,
}

impl StagedCopy {
    /// Path of the temporary sibling.
    pub fn temp_path(&self) -> &Path {
        self.temp.path()
    }

    /// Bytes written to the temporary file.
    pub fn len(&self) -> u64 {
        self.bytes
    }

    pub fn is_empty(&self) -> bool {
        self.bytes == 0
    }

    /// Rename the temporary file over the destination.
    pub fn commit(self) -> io::Result<u64> {
        let dir = parent_dir(&self.dst).to_path_buf();
        self.temp.persist(&self.dst).map_err(|e| e.error)?;
        sync_dir(&dir);
        Ok(self.bytes)
    }
}

/// Copy `src` into a temporary sibling of `dst` without touching `dst`.
///
/// The destination directory must already exist.
pub fn stage(src: &Path, dst: &Path) -> io::Result<StagedCopy> {
    let mut reader = File::open(src)?;
    let mut temp = temp_sibling(dst)?;
    let bytes = io::copy(&mut reader, temp.as_file_mut())?;
    temp.as_file().sync_all()?;
    Ok(StagedCopy {
        temp,
        dst: dst.to_path_buf(),
        bytes,
    })
}

/// Copy `src` to `dst` so readers of `dst` only ever see complete content.
pub fn copy_atomic(src: &Path, dst: &Path) -> io::Result<u64> {
    stage(src, dst)?.commit()
}

/// Write `content` to `dst` with the same guarantees as [`copy_atomic`].
pub fn write_atomic(dst: &Path, content: &[u8]) -> io::Result<()> {
    let mut temp = temp_sibling(dst)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;
    temp.persist(dst).map_err(|e| e.error)?;
    sync_dir(parent_dir(dst));
    Ok(())
}

fn temp_sibling(dst: &Path) -> io::Result<NamedTempFile> {
    let name = dst
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    tempfile::Builder::new()
        .prefix(&format!(".{name}."))
        .suffix(".tmp")
        .tempfile_in(parent_dir(dst))
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

/// Persist the rename itself. Not every filesystem supports fsync on a
/// directory handle (FUSE mounts often don't), so failures are ignored.
fn sync_dir(dir: &Path) {
    #[cfg(unix)]
    if let Ok(handle) = File::open(dir) {
        let _ = handle.sync_all();
    }
    #[cfg(not(unix))]
    let _ = dir;
}
