//! The engine-level error taxonomy.
//!
//! Every failure is typed so a caller can decide retry (lock conflicts),
//! abort (corruption), or ignore (key not found) without string matching.
//! Leaf-crate errors convert in via `#[from]` and keep their own variants
//! distinguishable through matching on the wrapper.

use aolog::LogError;
use keyindex::IndexError;
use segment::SegmentError;
use thiserror::Error;

/// Result type alias using [`EngineError`].
pub type Result<T> = std::result::Result<T, EngineError>;

/// Unified error type for engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A data operation was invoked before `start()`. Recoverable: call
    /// `start()` first.
    #[error("engine is not started")]
    NotStarted,

    /// `get` on a key that was never written. Expected and recoverable, not
    /// a fault.
    #[error("key not found")]
    KeyNotFound,

    /// The index holds a pointer into a log the engine does not manage.
    /// A fatal consistency violation, not a retryable condition.
    #[error("index points at unmanaged log {0}")]
    UnknownLog(u32),

    /// Two managed log files resolve to the same identifier (e.g. `7.log`
    /// and `007.log` placed in the directory by hand).
    #[error("two managed log files share id {0}")]
    DuplicateLogId(u32),

    /// Ran out of 32-bit log identifiers.
    #[error("log identifier overflow")]
    LogIdOverflow,

    /// Malformed key or value at encode time.
    #[error(transparent)]
    Segment(#[from] SegmentError),

    /// Log-level failure: lock conflict, invalid range, corrupt segment,
    /// or I/O.
    #[error(transparent)]
    Log(#[from] LogError),

    /// Index snapshot failure: missing, corrupt, or I/O.
    #[error(transparent)]
    Index(#[from] IndexError),

    /// A filesystem failure outside any single log or snapshot (directory
    /// scan, orphanize rename).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
