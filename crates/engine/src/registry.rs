//! One engine handle per data directory.
//!
//! The registry is an explicit, passable object owned by the caller's
//! composition root — there is no process-wide global. Within one registry,
//! two `open()` calls for the same directory path return the same logical
//! instance; different paths are fully independent.
//!
//! Paths are keyed as given (no canonicalization): callers that alias one
//! directory under two spellings get two handles, and the per-log file locks
//! are what actually keeps those from appending to the same files.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::{Engine, EngineConfig};

/// Mutex-guarded map from data-directory path to its engine handle.
#[derive(Debug, Default)]
pub struct EngineRegistry {
    config: EngineConfig,
    engines: Mutex<HashMap<PathBuf, Arc<Engine>>>,
}

impl EngineRegistry {
    /// A registry handing out engines with the default configuration.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// A registry handing out engines with `config`.
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            engines: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the engine for `dir`, creating it on first request.
    ///
    /// The returned engine is not started; callers invoke
    /// [`Engine::start`] themselves.
    pub fn open<P: AsRef<Path>>(&self, dir: P) -> Arc<Engine> {
        let dir = dir.as_ref().to_path_buf();
        let mut engines = self.engines.lock();
        Arc::clone(
            engines
                .entry(dir.clone())
                .or_insert_with(|| Arc::new(Engine::new(dir, self.config.clone()))),
        )
    }

    /// Number of directories with a live handle.
    pub fn len(&self) -> usize {
        self.engines.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
