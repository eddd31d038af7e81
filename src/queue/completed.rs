use parking_lot::Mutex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Input paths that were transcoded or skipped during this run.
///
/// Shared between workers; only ever grows.
#[derive(Debug, Default)]
pub struct CompletedSet {
    paths: Mutex<HashSet<PathBuf>>,
}

impl CompletedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a path. Returns `false` if it was already present.
    pub fn insert(&self, path: impl Into<PathBuf>) -> bool {
        self.paths.lock().insert(path.into())
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.paths.lock().contains(path)
    }

    pub fn len(&self) -> usize {
        self.paths.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.lock().is_empty()
    }

    /// Copy of the current contents.
    pub fn snapshot(&self) -> HashSet<PathBuf> {
        self.paths.lock().clone()
    }
}
