//! # Key index — the persistable file table
//!
//! In-memory mapping from key (exact byte equality) to the [`FilePointer`]
//! of that key's most recent on-disk segment. Later writes overwrite earlier
//! entries: last-write-wins.
//!
//! The whole mapping can be persisted to a snapshot file and restored from
//! it on the next start. Snapshots are bincode-encoded and written
//! atomically (tmp file, fsync, rename), so a crash mid-save leaves the
//! previous snapshot intact.
//!
//! "Snapshot missing" ([`IndexError::NotFound`], a normal first run) is kept
//! distinct from "snapshot unreadable" ([`IndexError::Corrupt`], damaged
//! state), so callers can tell the two apart.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while persisting or restoring the index.
#[derive(Debug, Error)]
pub enum IndexError {
    /// An underlying I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// No snapshot file exists at the given path (first run).
    #[error("no index snapshot at {0}")]
    NotFound(PathBuf),

    /// A snapshot file exists but cannot be decoded.
    #[error("corrupt index snapshot at {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },
}

/// Location of one segment: which log it lives in and where it starts.
///
/// Produced by a log append, stored in the index, looked up on every `get`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilePointer {
    /// Identifier of the owning log (the `<digits>` in `<digits>.log`).
    pub log_id: u32,
    /// Byte offset of the segment's first byte within that log.
    pub offset: u64,
}

impl FilePointer {
    pub fn new(log_id: u32, offset: u64) -> Self {
        Self { log_id, offset }
    }
}

/// Capability interface for the key -> pointer mapping.
///
/// [`KeyIndex`] is the only production implementation; the trait lets tests
/// substitute fakes without a filesystem.
pub trait FileTable {
    /// Inserts or overwrites the pointer for `key`.
    fn put(&mut self, key: Vec<u8>, pointer: FilePointer);

    /// Looks up the most recent pointer for `key`. Absent keys are `None`,
    /// never an error.
    fn get(&self, key: &[u8]) -> Option<FilePointer>;

    /// Number of distinct keys.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The file-backed key index.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyIndex {
    table: HashMap<Vec<u8>, FilePointer>,
}

impl KeyIndex {
    /// Constructs an index with zero entries — the first-start case.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Serializes the full mapping to `path`, replacing any existing
    /// snapshot atomically.
    ///
    /// # Errors
    ///
    /// Fails fast with [`IndexError::Io`] when the path is unwritable or the
    /// rename fails.
    pub fn save_to_disk<P: AsRef<Path>>(&self, path: P) -> Result<(), IndexError> {
        let path = path.as_ref();
        let encoded = bincode::serialize(&self.table)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        // tmp + fsync + rename so the previous snapshot survives a crash
        // mid-write.
        let tmp_path = tmp_snapshot_path(path);
        {
            let mut f = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&tmp_path)?;
            f.write_all(&encoded)?;
            f.flush()?;
            f.sync_all()?;
        }
        fs::rename(&tmp_path, path)?;
        Ok(())
    }

    /// Restores an index from the snapshot at `path`.
    ///
    /// # Errors
    ///
    /// * [`IndexError::NotFound`] — no file at `path` (first run).
    /// * [`IndexError::Corrupt`] — the file exists but cannot be decoded.
    pub fn load_from_disk<P: AsRef<Path>>(path: P) -> Result<Self, IndexError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(IndexError::NotFound(path.to_path_buf()));
        }

        let bytes = fs::read(path)?;
        let table = bincode::deserialize(&bytes).map_err(|e| IndexError::Corrupt {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(Self { table })
    }
}

impl FileTable for KeyIndex {
    fn put(&mut self, key: Vec<u8>, pointer: FilePointer) {
        self.table.insert(key, pointer);
    }

    fn get(&self, key: &[u8]) -> Option<FilePointer> {
        self.table.get(key).copied()
    }

    fn len(&self) -> usize {
        self.table.len()
    }
}

/// Sibling tmp path used during atomic snapshot writes.
fn tmp_snapshot_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests;
