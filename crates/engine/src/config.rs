//! Engine configuration with sensible defaults.

/// Active-log size threshold that triggers rotation (4 GiB).
pub const DEFAULT_ROTATION_THRESHOLD: u64 = 4 * 1024 * 1024 * 1024;

/// Tunables for one engine instance.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Once the active log's size exceeds this many bytes, the next `set`
    /// rotates to a fresh log. Enforcement is post-hoc: a single oversized
    /// value can push one log past the threshold before rotation triggers.
    pub rotation_threshold: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rotation_threshold: DEFAULT_ROTATION_THRESHOLD,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the rotation threshold in bytes.
    pub fn rotation_threshold(mut self, bytes: u64) -> Self {
        self.rotation_threshold = bytes;
        self
    }
}
