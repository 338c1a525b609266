//! # Engine — Bitcask-style append-only storage engine
//!
//! The central orchestrator tying the [`segment`], [`aolog`], and
//! [`keyindex`] crates into an embedded key-value store: point writes go to
//! an append-only log, point reads go through an in-memory key index, and a
//! compaction pass rewrites all live data into one fresh log.
//!
//! ## Architecture
//!
//! ```text
//! Caller
//!   |
//!   v
//! ┌───────────────────────────────────────────────┐
//! │                   ENGINE                      │
//! │                                               │
//! │ write.rs → encode segment → append to active  │
//! │               log → record pointer in index   │
//! │               |                               │
//! │               |  (size > rotation threshold?) │
//! │               v            yes                │
//! │            rotate → new active log (id+1)     │
//! │                                               │
//! │ read.rs  → index lookup → read_segment at     │
//! │            (log id, offset) → value bytes     │
//! │                                               │
//! │ compaction.rs → replay all logs newest-first, │
//! │            first-seen-wins, into one new log; │
//! │            orphanize the old ones             │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! ## Module Responsibilities
//!
//! | Module         | Purpose                                            |
//! |----------------|----------------------------------------------------|
//! | `lib.rs`       | `Engine` struct, constructor, accessors            |
//! | [`recovery`]   | `start()` / `stop()`, directory scan, snapshot I/O |
//! | [`write`]      | `set()` and log rotation                           |
//! | [`read`]       | `get()`                                            |
//! | [`compaction`] | descending replay, orphanize, snapshot persist     |
//! | [`registry`]   | one engine handle per data directory               |
//! | [`config`]     | rotation threshold                                 |
//! | [`error`]      | the typed failure taxonomy                         |
//!
//! ## On-disk layout (one directory per engine)
//!
//! ```text
//! <dir>/
//!   ├── 1.log           append-only segment logs; highest id is active
//!   ├── 2.log
//!   ├── _1.log          orphanized by compaction; ignored; safe to delete
//!   └── index.snapshot  persisted key index (bincode, atomically replaced)
//! ```
//!
//! ## Concurrency
//!
//! Synchronous, no background threads. One `parking_lot::Mutex` guards all
//! engine state, so `set`, `get`, rotation, and `compaction` never
//! interleave into an inconsistent intermediate state. Each open log also
//! holds an exclusive file lock, which keeps a second *process* out of the
//! same directory.

mod compaction;
mod config;
mod error;
mod read;
mod recovery;
mod registry;
mod write;

pub use config::{EngineConfig, DEFAULT_ROTATION_THRESHOLD};
pub use error::{EngineError, Result};
pub use registry::EngineRegistry;

use aolog::FileLog;
use keyindex::{FileTable, KeyIndex};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Fixed name of the key-index snapshot file within the data directory.
pub const SNAPSHOT_FILENAME: &str = "index.snapshot";

/// An embedded append-only key-value store over one data directory.
///
/// Lifecycle: `NotStarted -> Started -> Stopped`. Every data operation
/// requires a prior [`start`](Engine::start); `start` and
/// [`stop`](Engine::stop) are both idempotent.
///
/// Handles are normally obtained through an [`EngineRegistry`], which
/// guarantees at most one instance per directory. Constructing directly with
/// [`Engine::new`] is fine for tests and single-use embedding — the per-log
/// file locks still keep two instances from appending to the same files.
pub struct Engine {
    dir: PathBuf,
    snapshot_path: PathBuf,
    config: EngineConfig,
    state: Mutex<EngineState>,
}

/// Everything that changes between `start` and `stop`, guarded by one mutex.
#[derive(Default)]
struct EngineState {
    started: bool,
    /// All open logs keyed by identifier. Ordered, so the highest key is the
    /// active log.
    logs: BTreeMap<u32, FileLog>,
    /// Identifier of the only log that receives appends.
    active_id: u32,
    index: KeyIndex,
}

impl EngineState {
    fn require_started(&self) -> Result<()> {
        if self.started {
            Ok(())
        } else {
            Err(EngineError::NotStarted)
        }
    }

    fn active_log_mut(&mut self) -> Result<&mut FileLog> {
        let id = self.active_id;
        self.logs.get_mut(&id).ok_or(EngineError::UnknownLog(id))
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Engine")
            .field("dir", &self.dir)
            .field("started", &state.started)
            .field("active_id", &state.active_id)
            .field("open_logs", &state.logs.len())
            .field("indexed_keys", &state.index.len())
            .field("rotation_threshold", &self.config.rotation_threshold)
            .finish()
    }
}

impl Engine {
    /// Creates a not-yet-started engine over `dir`.
    ///
    /// The directory is expected to exist; the engine creates files, never
    /// directories.
    pub fn new<P: AsRef<Path>>(dir: P, config: EngineConfig) -> Self {
        let dir = dir.as_ref().to_path_buf();
        let snapshot_path = dir.join(SNAPSHOT_FILENAME);
        Self {
            dir,
            snapshot_path,
            config,
            state: Mutex::new(EngineState::default()),
        }
    }

    /// The data directory this engine manages.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// True between a successful `start()` and the next `stop()`.
    pub fn is_started(&self) -> bool {
        self.state.lock().started
    }
}

#[cfg(test)]
mod tests;
