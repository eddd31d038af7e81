use crate::config::Profile;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Suffix of a provisional output, stripped once the transcode succeeds.
pub const TEMP_SUFFIX: &str = ".tmp";

/// One queued transcode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub input: PathBuf,
    /// Provisional output path (ends in [`TEMP_SUFFIX`]).
    pub output: PathBuf,
    pub profile: String,
}

impl Job {
    pub fn new(input: impl Into<PathBuf>, profile_name: &str, profile: &Profile) -> Self {
        let input = input.into();
        let output = output_path(&input, &profile.extension);
        Self {
            input,
            output,
            profile: profile_name.to_string(),
        }
    }

    /// Where the output ends up after the provisional suffix is removed.
    pub fn final_output(&self) -> PathBuf {
        self.output.with_extension("")
    }
}

/// Provisional output for `input`: last extension replaced by `extension`,
/// then [`TEMP_SUFFIX`] appended.
pub fn output_path(input: &Path, extension: &str) -> PathBuf {
    let mut output = OsString::from(input.with_extension(extension.trim_start_matches('.')));
    output.push(TEMP_SUFFIX);
    PathBuf::from(output)
}
