//! Write path: `set()` and log rotation.
//!
//! A write is encoded into a checksummed segment, appended to the active log
//! as one contiguous write, and its resulting location recorded in the key
//! index. Rotation is checked after the append: once the active log's size
//! exceeds the configured threshold, the engine switches to a fresh log with
//! the next identifier. The previous log stays open for reads but receives
//! no further appends.

use aolog::{FileLog, Log};
use keyindex::FileTable;
use segment::Segment;
use tracing::info;

use crate::{Engine, EngineError, EngineState, Result};

impl Engine {
    /// Writes a key-value pair durably to the active log.
    ///
    /// Later writes to the same key overwrite earlier ones on lookup
    /// (last-write-wins); the superseded segment's bytes are reclaimed by
    /// the next `compaction()`.
    ///
    /// # Errors
    ///
    /// * [`EngineError::NotStarted`] — `start()` has not run.
    /// * [`EngineError::Segment`] — empty key, key over 65535 bytes, or
    ///   value over `i32::MAX` bytes.
    /// * [`EngineError::Log`] — the append itself failed.
    pub fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let mut state = self.state.lock();
        state.require_started()?;

        let segment = Segment::encode(key, value)?;
        let active = state.active_log_mut()?;
        let pointer = active.append(segment.as_bytes())?;
        let size = active.size()?;
        state.index.put(key.to_vec(), pointer);

        if size > self.config.rotation_threshold {
            self.rotate(&mut state)?;
        }
        Ok(())
    }

    /// Switches appends to a brand-new log with identifier `active + 1`.
    ///
    /// The old active log remains in the managed set (its segments are still
    /// referenced by the index) but is rotated out of the append role.
    fn rotate(&self, state: &mut EngineState) -> Result<()> {
        let next_id = state
            .active_id
            .checked_add(1)
            .ok_or(EngineError::LogIdOverflow)?;
        let log = FileLog::open(self.log_path(next_id))?;

        info!(from = state.active_id, to = next_id, "rotated active log");
        state.logs.insert(next_id, log);
        state.active_id = next_id;
        Ok(())
    }
}
