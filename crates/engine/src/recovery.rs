//! Cold start and shutdown: snapshot restore, directory scan, log open and
//! close.
//!
//! `start()` never replays log contents — the index comes from the snapshot
//! written by the previous `stop()` or `compaction()`. Segments written after
//! the last snapshot become reachable again through `compaction()`, which
//! rebuilds the index from the logs themselves.

use aolog::{parse_log_id, FileLog, Log};
use keyindex::{FileTable, IndexError, KeyIndex};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::{Engine, EngineError, Result};

/// Scans `dir` for managed `<digits>.log` files, sorted ascending by id.
///
/// Orphanized `_<digits>.log` files, the snapshot, and anything else that
/// does not follow the naming scheme are ignored.
pub(crate) fn scan_managed_logs(dir: &Path) -> Result<Vec<(u32, PathBuf)>> {
    let mut found: Vec<(u32, PathBuf)> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter_map(|path| parse_log_id(&path).map(|id| (id, path)))
        .collect();
    found.sort_by_key(|(id, _)| *id);
    Ok(found)
}

impl Engine {
    /// Path of the `<id>.log` file inside this engine's directory.
    pub(crate) fn log_path(&self, id: u32) -> PathBuf {
        self.dir.join(format!("{id}.log"))
    }

    /// Brings the engine into the started state. No-op when already started.
    ///
    /// 1. Restore the key index from `index.snapshot` if present, otherwise
    ///    start empty.
    /// 2. Open every managed `<digits>.log` in the directory, taking each
    ///    file's exclusive lock.
    /// 3. The highest id becomes the active log; a fresh directory gets
    ///    `1.log`.
    ///
    /// # Errors
    ///
    /// * [`EngineError::Index`] — the snapshot exists but is corrupt
    ///   (distinct from "no snapshot", which is a normal first run).
    /// * [`EngineError::Log`] — a log cannot be opened or locked.
    /// * [`EngineError::DuplicateLogId`] — two files parse to the same id.
    pub fn start(&self) -> Result<()> {
        let mut state = self.state.lock();
        if state.started {
            return Ok(());
        }

        let index = match KeyIndex::load_from_disk(&self.snapshot_path) {
            Ok(index) => index,
            Err(IndexError::NotFound(_)) => KeyIndex::empty(),
            Err(e) => return Err(e.into()),
        };

        let mut logs = BTreeMap::new();
        for (id, path) in scan_managed_logs(&self.dir)? {
            let log = FileLog::open(&path)?;
            if logs.insert(id, log).is_some() {
                return Err(EngineError::DuplicateLogId(id));
            }
        }

        let active_id = match logs.keys().next_back() {
            Some(&id) => id,
            None => {
                logs.insert(1, FileLog::open(self.log_path(1))?);
                1
            }
        };

        info!(
            dir = %self.dir.display(),
            logs = logs.len(),
            active = active_id,
            keys = index.len(),
            "engine started"
        );

        state.index = index;
        state.logs = logs;
        state.active_id = active_id;
        state.started = true;
        Ok(())
    }

    /// Persists the key index, closes every log, and leaves the started
    /// state. No-op when already stopped.
    ///
    /// The snapshot is written **before** any log is closed — losing the
    /// index would orphan every write since the last snapshot from future
    /// lookups, so a persist failure propagates with all logs still open.
    /// Close failures are best-effort: every log is attempted, the first
    /// failure surfaces at the end.
    pub fn stop(&self) -> Result<()> {
        let mut state = self.state.lock();
        if !state.started {
            return Ok(());
        }

        state.index.save_to_disk(&self.snapshot_path)?;

        let mut first_err = None;
        for (id, log) in std::mem::take(&mut state.logs) {
            if let Err(e) = log.close() {
                warn!(log = id, error = %e, "failed to close log during stop");
                first_err.get_or_insert(e);
            }
        }

        state.started = false;
        state.active_id = 0;
        state.index = KeyIndex::empty();
        info!(dir = %self.dir.display(), "engine stopped");

        match first_err {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}
