//! Pending-file persistence.
//!
//! A pending file lists paths still needing work, one per line. After a run
//! the file is rewritten without the paths that were completed, or removed
//! once nothing is left, so repeated runs converge.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{info, warn};

/// What [`reconcile_pending`] did to the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingOutcome {
    /// The file now lists `remaining` paths.
    Rewritten { remaining: usize },
    /// Nothing left; the file was deleted (or never existed).
    Removed,
}

/// Read a pending file. A missing file yields an empty list.
pub fn load_pending(path: &Path) -> Result<Vec<PathBuf>> {
    if !path.exists() {
        warn!("Queue file {} not found", path.display());
        return Ok(Vec::new());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read queue file {}", path.display()))?;

    Ok(parse_pending(&content))
}

/// Split pending-file text into paths, dropping blank lines and trailing
/// whitespace.
pub fn parse_pending(content: &str) -> Vec<PathBuf> {
    content
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .map(PathBuf::from)
        .collect()
}

/// Re-read `path` and drop every entry found in `completed`.
///
/// Entries are compared in absolute form. Survivors are written back
/// deduplicated in first-appearance order; an empty remainder deletes the
/// file.
pub fn reconcile_pending(path: &Path, completed: &HashSet<PathBuf>) -> Result<PendingOutcome> {
    let entries = load_pending(path)?;

    let mut seen = HashSet::new();
    let remaining: Vec<PathBuf> = entries
        .into_iter()
        .filter(|entry| !is_completed(entry, completed))
        .filter(|entry| seen.insert(absolute(entry)))
        .collect();

    if remaining.is_empty() {
        if path.exists() {
            std::fs::remove_file(path)
                .with_context(|| format!("Failed to remove queue file {}", path.display()))?;
            info!("Queue file {} finished, removed", path.display());
        }
        return Ok(PendingOutcome::Removed);
    }

    write_pending(path, &remaining)?;
    info!(
        "Queue file {} rewritten with {} remaining",
        path.display(),
        remaining.len()
    );
    Ok(PendingOutcome::Rewritten {
        remaining: remaining.len(),
    })
}

/// Overwrite `path` with `entries` through a temporary file in the same
/// directory.
pub fn write_pending(path: &Path, entries: &[PathBuf]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
    for entry in entries {
        writeln!(tmp, "{}", entry.display())?;
    }
    tmp.flush()?;

    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to write queue file {}", path.display()))?;
    Ok(())
}

fn is_completed(entry: &Path, completed: &HashSet<PathBuf>) -> bool {
    completed.contains(entry) || completed.contains(&absolute(entry))
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
