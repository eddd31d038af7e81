//! Media file probing module.
//!
//! The [`Prober`] trait is the boundary between the rule engine and whatever
//! produces [`MediaAttributes`]. [`FfmpegProber`] is the production backend.

mod ffmpeg;
mod types;

pub use ffmpeg::{parse_ffmpeg_output, probe_with_ffmpeg};
pub use types::MediaAttributes;

use crate::Result;
use std::path::{Path, PathBuf};

/// A media file prober capable of extracting attributes from video files.
///
/// Implementations must be safe to share across threads (`Send + Sync`).
pub trait Prober: Send + Sync {
    /// Human-readable name identifying this prober implementation.
    fn name(&self) -> &'static str;

    /// Probe a media file at the given path and extract its attributes.
    fn probe(&self, path: &Path) -> Result<MediaAttributes>;

    /// Probe a file, falling back to [`MediaAttributes::unknown`] on failure.
    ///
    /// Probe failures are per-file problems, so they are logged here and the
    /// caller only has to check [`MediaAttributes::is_known`].
    fn probe_or_unknown(&self, path: &Path) -> MediaAttributes {
        match self.probe(path) {
            Ok(attrs) => attrs,
            Err(e) => {
                tracing::warn!("{} probe failed for {}: {}", self.name(), path.display(), e);
                MediaAttributes::unknown()
            }
        }
    }
}

/// Prober that shells out to an ffmpeg executable.
#[derive(Debug, Clone)]
pub struct FfmpegProber {
    executable: PathBuf,
}

impl FfmpegProber {
    /// Create a prober using the given ffmpeg executable.
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    /// Path of the executable this prober runs.
    pub fn executable(&self) -> &Path {
        &self.executable
    }
}

impl Default for FfmpegProber {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl Prober for FfmpegProber {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    fn probe(&self, path: &Path) -> Result<MediaAttributes> {
        probe_with_ffmpeg(&self.executable, path)
    }
}
