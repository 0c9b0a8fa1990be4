// SPDX-FileCopyrightText: 2026 Litebook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Content hashing and the persisted checksum baseline.
//!
//! The baseline is a single lowercase hex SHA-256 digest followed by a
//! newline. It is rewritten with the same temp-then-rename discipline as the
//! database mirror, so a reader sees either the old digest or the new one.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use litebook_core::LitebookError;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::copier;

/// Read size for streaming hashes.
const HASH_CHUNK: usize = 4 * 1024 * 1024;

/// Hash a file's content without loading it into memory at once.
pub fn hash_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; HASH_CHUNK];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Persisted hash of the file content last confirmed on the mirror.
#[derive(Debug, Clone)]
pub struct ChecksumStore {
    path: PathBuf,
}

impl ChecksumStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the baseline, if one has been recorded.
    ///
    /// An unreadable or empty record is treated as absent: the next sync then
    /// uploads unconditionally, which is always safe.
    pub fn load(&self) -> Option<String> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => {
                let hash = content.trim();
                if hash.is_empty() {
                    None
                } else if !hash.bytes().all(|b| b.is_ascii_hexdigit()) {
                    warn!(path = %self.path.display(), "checksum baseline is not a hex digest, treating as absent");
                    None
                } else {
                    Some(hash.to_string())
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "checksum baseline unreadable, treating as absent");
                None
            }
        }
    }

    /// When the baseline was last written, taken from the file's mtime.
    pub fn recorded_at(&self) -> Option<DateTime<Utc>> {
        let modified = std::fs::metadata(&self.path)
            .and_then(|m| m.modified())
            .ok()?;
        Some(DateTime::<Utc>::from(modified))
    }

    /// Atomically replace the baseline with `hash`.
    pub fn save(&self, hash: &str) -> Result<(), LitebookError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| LitebookError::io("create checksum directory", e))?;
        }
        copier::write_atomic(&self.path, format!("{hash}\n").as_bytes())
            .map_err(|e| LitebookError::io("write checksum baseline", e))?;
        debug!(path = %self.path.display(), hash = %short(hash), "checksum baseline saved");
        Ok(())
    }
}

/// First eight characters of a digest, for log lines.
pub fn short(hash: &str) -> &str {
    hash.char_indices()
        .nth(8)
        .map_or(hash, |(end, _)| &hash[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn short_cuts_on_character_boundaries() {
        assert_eq!(short("0123456789abcdef"), "01234567");
        assert_eq!(short("abc"), "abc");
        assert_eq!(short("€€€€€€€€€€"), "€€€€€€€€");
    }

    #[test]
    fn corrupt_record_is_treated_as_absent() {
        let dir = tempdir().unwrap();
        let store = ChecksumStore::new(dir.path().join("app.db.sha256"));
        std::fs::write(store.path(), "€€€ not a digest\n").unwrap();
        assert_eq!(store.load(), None);

        store.save("00ff").unwrap();
        assert_eq!(store.load().as_deref(), Some("00ff"));
    }

    #[test]
    fn hash_matches_known_sha256() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("abc.txt");
        std::fs::write(&path, b"abc").unwrap();
        assert_eq!(
            hash_file(&path).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn hash_of_empty_file_is_stable() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.db");
        std::fs::write(&path, b"").unwrap();
        assert_eq!(
            hash_file(&path).unwrap(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn hash_spans_multiple_chunks() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.bin");
        let b = dir.path().join("b.bin");
        let mut content = vec![7u8; HASH_CHUNK + 17];
        std::fs::write(&a, &content).unwrap();
        *content.last_mut().unwrap() = 8;
        std::fs::write(&b, &content).unwrap();
        assert_ne!(hash_file(&a).unwrap(), hash_file(&b).unwrap());
    }

    #[test]
    fn missing_baseline_loads_as_none() {
        let dir = tempdir().unwrap();
        let store = ChecksumStore::new(dir.path().join("litebook.db.sum"));
        assert_eq!(store.load(), None);
    }

    #[test]
    fn save_then_load_trims_newline() {
        let dir = tempdir().unwrap();
        let store = ChecksumStore::new(dir.path().join("nested/litebook.db.sum"));
        store.save("deadbeef").unwrap();
        assert_eq!(
            std::fs::read_to_string(store.path()).unwrap(),
            "deadbeef\n"
        );
        assert_eq!(store.load().as_deref(), Some("deadbeef"));
    }

    #[test]
    fn save_overwrites_previous_baseline() {
        let dir = tempdir().unwrap();
        let store = ChecksumStore::new(dir.path().join("litebook.db.sum"));
        store.save("1111").unwrap();
        store.save("2222").unwrap();
        assert_eq!(store.load().as_deref(), Some("2222"));
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(leftovers.len(), 1, "temp files left behind: {leftovers:?}");
    }

    #[test]
    fn recorded_at_follows_saves() {
        let dir = tempdir().unwrap();
        let store = ChecksumStore::new(dir.path().join("litebook.db.sum"));
        assert_eq!(store.recorded_at(), None);

        let before = Utc::now() - chrono::Duration::seconds(5);
        store.save("abcd").unwrap();
        let at = store.recorded_at().expect("timestamp after save");
        assert!(at >= before);
    }

    #[test]
    fn blank_baseline_is_absent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("litebook.db.sum");
        std::fs::write(&path, "  \n").unwrap();
        assert_eq!(ChecksumStore::new(path).load(), None);
    }
}
