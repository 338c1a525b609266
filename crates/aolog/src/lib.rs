//! # Append-only log
//!
//! One [`FileLog`] owns one on-disk log file: an append-only concatenation of
//! [`segment::Segment`] records. The engine keeps several of these open at
//! once (one per log id) but only ever appends to the highest-numbered one.
//!
//! ## Naming
//!
//! A managed log file is named `<digits>.log`, where `<digits>` is the log's
//! base-10 identifier (`1.log`, `2.log`, ...). Anything else — including the
//! `_<digits>.log` files left behind by compaction — is not a managed log and
//! is ignored by [`parse_log_id`].
//!
//! ## Locking
//!
//! Opening a log takes an exclusive advisory lock on the whole file, so a
//! second engine over the same file fails up front with
//! [`LogError::LockConflict`] instead of corrupting it. The lock lives as
//! long as the handle; [`FileLog::close`] consumes the handle, so
//! use-after-close is a compile error rather than a runtime surprise.
//!
//! ## Reading
//!
//! [`Log::read_segment`] is the sole integrity gate between the bytes on disk
//! and the index: it reads the fixed header at the given offset, sizes the
//! full record from the declared lengths, and rejects anything that fails
//! [`segment::Segment::is_valid`] with [`LogError::CorruptSegment`].

use byteorder::{BigEndian, ByteOrder};
use bytes::Bytes;
use fs2::FileExt;
use keyindex::FilePointer;
use segment::{Segment, CRC_LEN, HEADER_LEN, KEY_LEN_LEN};
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during log operations.
#[derive(Debug, Error)]
pub enum LogError {
    /// An underlying I/O error.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// The file's exclusive lock is already held, by this process or another.
    #[error("log file already locked: {0}")]
    LockConflict(PathBuf),

    /// The path does not follow the `<digits>.log` naming scheme.
    #[error("not a managed log file: {0}")]
    NotManaged(PathBuf),

    /// A read request fell outside the log's current bounds.
    #[error("invalid read range: offset {offset}, length {length}, log size {size}")]
    InvalidRange { offset: u64, length: u64, size: u64 },

    /// The record at `offset` failed checksum or structural validation.
    /// Signals on-disk or pointer corruption; not retryable.
    #[error("corrupt segment at offset {offset} in {path}")]
    CorruptSegment { path: PathBuf, offset: u64 },
}

/// Capability interface for one append-only log.
///
/// [`FileLog`] is the only production implementation; the trait exists so
/// tests elsewhere can substitute in-memory fakes without touching the
/// filesystem.
pub trait Log {
    /// Current file length in bytes.
    fn size(&self) -> Result<u64, LogError>;

    /// Appends `bytes` as one contiguous write at the current end of the
    /// file, returning a pointer to the offset where the write began.
    fn append(&mut self, bytes: &[u8]) -> Result<FilePointer, LogError>;

    /// Reads `length` raw bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// [`LogError::InvalidRange`] when `length == 0`, `offset >= size`, or
    /// the range runs past the end of the file.
    fn read(&self, offset: u64, length: u64) -> Result<Bytes, LogError>;

    /// Reads and validates the full segment starting at `offset`.
    ///
    /// The two length fields are read at their fixed header positions to
    /// size the record, then the whole record is read and decoded.
    ///
    /// # Errors
    ///
    /// * [`LogError::InvalidRange`] — `offset` outside `[0, size)`, or the
    ///   sized record runs past the end of the file (truncated tail).
    /// * [`LogError::CorruptSegment`] — the decoded record fails
    ///   [`Segment::is_valid`].
    fn read_segment(&self, offset: u64) -> Result<Segment, LogError>;

    /// The log's numeric identifier, parsed from its filename.
    fn id(&self) -> u32;

    /// The log's file path.
    fn path(&self) -> &Path;

    /// Flushes OS buffers, releases the lock, and closes the file handle.
    ///
    /// Consumes the handle: there is no way to operate on a closed log.
    fn close(self) -> Result<(), LogError>
    where
        Self: Sized;
}

/// Parses a log identifier from a `<digits>.log` filename.
///
/// Returns `None` for anything that is not purely numeric (orphanized
/// `_<digits>.log` files, the index snapshot, stray files) and for id `0` —
/// identifiers are positive. Leading zeros parse numerically: `007.log`
/// is id 7.
pub fn parse_log_id(path: &Path) -> Option<u32> {
    let name = path.file_name()?.to_str()?;
    let stem = name.strip_suffix(".log")?;
    if stem.is_empty() || !stem.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    stem.parse().ok().filter(|&id| id > 0)
}

/// File-backed append-only log holding an exclusive lock for its lifetime.
#[derive(Debug)]
pub struct FileLog {
    path: PathBuf,
    id: u32,
    file: File,
}

impl FileLog {
    /// Opens (creating if absent) the log file at `path` for read/write and
    /// takes an exclusive advisory lock on it.
    ///
    /// # Errors
    ///
    /// * [`LogError::NotManaged`] — the filename is not `<digits>.log`.
    /// * [`LogError::LockConflict`] — the lock is already held.
    /// * [`LogError::Io`] — open failure.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, LogError> {
        let path = path.as_ref().to_path_buf();
        let id = parse_log_id(&path).ok_or_else(|| LogError::NotManaged(path.clone()))?;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&path)?;

        file.try_lock_exclusive()
            .map_err(|_| LogError::LockConflict(path.clone()))?;

        Ok(Self { path, id, file })
    }
}

impl Log for FileLog {
    fn size(&self) -> Result<u64, LogError> {
        Ok(self.file.metadata()?.len())
    }

    fn append(&mut self, bytes: &[u8]) -> Result<FilePointer, LogError> {
        // The pointer reflects the log's size before this call.
        let offset = self.file.seek(SeekFrom::End(0))?;
        self.file.write_all(bytes)?;
        self.file.flush()?;
        Ok(FilePointer::new(self.id, offset))
    }

    fn read(&self, offset: u64, length: u64) -> Result<Bytes, LogError> {
        let size = self.size()?;
        let out_of_range = length == 0
            || offset >= size
            || offset
                .checked_add(length)
                .map(|end| end > size)
                .unwrap_or(true);
        if out_of_range {
            return Err(LogError::InvalidRange {
                offset,
                length,
                size,
            });
        }

        let mut buf = vec![0u8; length as usize];
        let mut f = &self.file;
        f.seek(SeekFrom::Start(offset))?;
        f.read_exact(&mut buf)?;
        Ok(Bytes::from(buf))
    }

    fn read_segment(&self, offset: u64) -> Result<Segment, LogError> {
        let size = self.size()?;
        if offset >= size {
            return Err(LogError::InvalidRange {
                offset,
                length: 0,
                size,
            });
        }

        // Fixed header first: enough to size the whole record.
        let header = self.read(offset, HEADER_LEN as u64)?;
        let key_len = BigEndian::read_u16(&header[CRC_LEN..CRC_LEN + KEY_LEN_LEN]) as u64;
        let value_len = BigEndian::read_i32(&header[CRC_LEN + KEY_LEN_LEN..HEADER_LEN]);
        if value_len < 0 {
            return Err(LogError::CorruptSegment {
                path: self.path.clone(),
                offset,
            });
        }

        let total = HEADER_LEN as u64 + key_len + value_len as u64;
        let seg = Segment::from_bytes(self.read(offset, total)?);
        if !seg.is_valid() {
            return Err(LogError::CorruptSegment {
                path: self.path.clone(),
                offset,
            });
        }
        Ok(seg)
    }

    fn id(&self) -> u32 {
        self.id
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn close(self) -> Result<(), LogError> {
        self.file.sync_all()?;
        self.file.unlock()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests;
