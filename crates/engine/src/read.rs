//! Read path: `get()`.
//!
//! A lookup is two hops: key index to file pointer, then a validated
//! segment read at that (log, offset). The value bytes hand back a slice of
//! the buffer read from disk — no extra copy.

use aolog::Log;
use bytes::Bytes;
use keyindex::FileTable;

use crate::{Engine, EngineError, Result};

impl Engine {
    /// Looks up the most recent value written for `key`.
    ///
    /// # Errors
    ///
    /// * [`EngineError::NotStarted`] — `start()` has not run.
    /// * [`EngineError::KeyNotFound`] — the key was never written. Expected
    ///   and recoverable.
    /// * [`EngineError::UnknownLog`] — the index points at a log the engine
    ///   does not manage; a fatal consistency violation.
    /// * [`EngineError::Log`] with `CorruptSegment` — the stored pointer no
    ///   longer resolves to a valid segment. Only external file tampering
    ///   can cause this; it is not retryable.
    pub fn get(&self, key: &[u8]) -> Result<Bytes> {
        let state = self.state.lock();
        state.require_started()?;

        let pointer = state.index.get(key).ok_or(EngineError::KeyNotFound)?;
        let log = state
            .logs
            .get(&pointer.log_id)
            .ok_or(EngineError::UnknownLog(pointer.log_id))?;

        let segment = log.read_segment(pointer.offset)?;
        Ok(segment.value())
    }
}
