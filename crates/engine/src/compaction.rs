//! Compaction: rewrite every live key-value pair into one fresh log and
//! orphanize all prior logs.
//!
//! The replay order is the crux of correctness: source logs are scanned in
//! **descending** id order, newest first, and a key is copied only the first
//! time it is seen. First-seen-wins under descending replay is equivalent to
//! last-write-wins under chronological order, so the fresh log ends up with
//! exactly the live value for every key — including keys whose segments were
//! never snapshotted into the index.

use aolog::{FileLog, Log};
use keyindex::{FileTable, KeyIndex};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use tracing::info;

use crate::recovery::scan_managed_logs;
use crate::{Engine, EngineError, Result};

impl Engine {
    /// Rewrites all live data into a single new log, bounding total disk
    /// usage and future scan cost.
    ///
    /// # Algorithm
    ///
    /// 1. Close every open log (flushing OS buffers and releasing locks).
    /// 2. Re-scan the directory for `<digits>.log`, sorted descending.
    /// 3. Build a fresh, empty key index.
    /// 4. Create a new active log with id `highest + 1`.
    /// 5. Scan each source log sequentially from offset 0; copy a segment's
    ///    raw bytes unchanged into the new log unless its key was already
    ///    seen in a newer log.
    /// 6. After draining a source log, orphanize it: rename `N.log` to
    ///    `_N.log` so directory scans ignore it while the bytes remain for
    ///    manual audit. A rename failure is fatal.
    /// 7. Keep only the new log in the managed set and persist the fresh
    ///    index.
    ///
    /// # Errors
    ///
    /// A corrupt segment encountered mid-scan aborts the whole pass with the
    /// source logs un-orphanized. The engine holds no open logs after a
    /// failed pass; `stop()` and `start()` return it to a clean state before
    /// a retry.
    pub fn compaction(&self) -> Result<()> {
        let mut state = self.state.lock();
        state.require_started()?;

        // 1. Release every lock so the rescan below can reopen the files.
        for (_, log) in std::mem::take(&mut state.logs) {
            log.close()?;
        }

        // 2. Newest first.
        let mut sources = scan_managed_logs(&self.dir)?;
        sources.sort_by(|a, b| b.0.cmp(&a.0));

        // 3./4.
        let highest = sources.first().map(|(id, _)| *id).unwrap_or(state.active_id);
        let next_id = highest
            .max(state.active_id)
            .checked_add(1)
            .ok_or(EngineError::LogIdOverflow)?;
        let mut fresh = KeyIndex::empty();
        let mut active = FileLog::open(self.log_path(next_id))?;

        // 5./6.
        let mut total = 0usize;
        for (_, path) in &sources {
            let source = FileLog::open(path)?;
            let size = source.size()?;
            let mut offset = 0;
            while offset < size {
                let segment = source.read_segment(offset)?;
                offset += segment.len() as u64;
                total += 1;

                let key = segment.key();
                if fresh.get(&key).is_some() {
                    // A newer log already supplied the live value.
                    continue;
                }
                let pointer = active.append(segment.as_bytes())?;
                fresh.put(key.to_vec(), pointer);
            }
            orphanize(source)?;
        }

        info!(
            dir = %self.dir.display(),
            sources = sources.len(),
            segments = total,
            live = fresh.len(),
            active = next_id,
            "compaction complete"
        );

        // 7.
        let mut logs = BTreeMap::new();
        logs.insert(next_id, active);
        state.logs = logs;
        state.active_id = next_id;
        state.index = fresh;
        state.index.save_to_disk(&self.snapshot_path)?;
        Ok(())
    }
}

/// Closes a drained source log and renames it out of the managed namespace
/// by prefixing its filename with `_`.
fn orphanize(log: FileLog) -> Result<()> {
    let path = log.path().to_path_buf();
    log.close()?;

    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            EngineError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                "log path has no filename",
            ))
        })?;
    fs::rename(&path, path.with_file_name(format!("_{name}")))?;
    Ok(())
}
