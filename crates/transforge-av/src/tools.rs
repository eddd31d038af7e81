//! External tool detection.

use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Require that a tool is available on `PATH`, returning its path.
///
/// # Errors
///
/// Returns an error if the tool is not found.
pub fn require_tool(name: &str) -> Result<PathBuf> {
    which::which(name).map_err(|_| Error::tool_not_found(name))
}

/// Resolve a configured executable.
///
/// Anything containing a path separator is taken as a path and must exist;
/// a bare name is looked up on `PATH`.
pub fn resolve_tool(configured: &Path) -> Result<PathBuf> {
    if configured.components().count() > 1 || configured.is_absolute() {
        if configured.exists() {
            return Ok(configured.to_path_buf());
        }
        return Err(Error::tool_not_found(configured.display().to_string()));
    }

    require_tool(&configured.to_string_lossy())
}
