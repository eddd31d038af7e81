//! Media attribute types.

/// Snapshot of the attributes rules are evaluated against.
///
/// Built once per input file from probe output and never mutated. A `None`
/// codec marks attributes that could not be extracted; such files are
/// reported and skipped rather than matched.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaAttributes {
    /// Video codec name as reported by the probe (e.g. "h264", "hevc").
    pub video_codec: Option<String>,
    /// Height of the first video stream in pixels, 0 if unknown.
    pub res_height: u32,
    /// Width of the first video stream in pixels, 0 if unknown.
    pub res_width: u32,
    /// Runtime in whole minutes.
    pub runtime_minutes: u32,
    /// Size of the source file in megabytes (1 MB = 1024 * 1024 bytes).
    pub source_size_mb: f64,
    /// Frame rate rounded to the nearest integer.
    pub fps: u32,
}

impl MediaAttributes {
    /// Attributes for a file whose probe output could not be parsed.
    pub fn unknown() -> Self {
        Self {
            video_codec: None,
            res_height: 0,
            res_width: 0,
            runtime_minutes: 0,
            source_size_mb: 0.0,
            fps: 0,
        }
    }

    /// Whether the probe produced a usable video stream description.
    pub fn is_known(&self) -> bool {
        self.video_codec.is_some()
    }

    /// Convert a byte count to the megabyte unit used by `source_size_mb`.
    pub fn megabytes(bytes: u64) -> f64 {
        bytes as f64 / (1024.0 * 1024.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_is_not_known() {
        let attrs = MediaAttributes::unknown();
        assert!(!attrs.is_known());
        assert_eq!(attrs.res_height, 0);
    }

    #[test]
    fn test_megabytes() {
        assert_eq!(MediaAttributes::megabytes(1024 * 1024), 1.0);
        assert_eq!(MediaAttributes::megabytes(512 * 1024), 0.5);
    }
}
