//! Shared helpers for integration tests.
//!
//! [`FakeFfmpeg`] writes a shell script that stands in for ffmpeg: probe
//! calls (`-hide_banner -i <file>`) print a canned stream summary, and
//! transcode calls create the output file given as the last argument.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Probe output; the resolution depends on the file name.
///
/// - names containing `small` report 640x480
/// - anything else reports 1920x1080
/// - names containing `broken` make the transcode exit 1 after writing a
///   partial output
/// - names containing `corrupt` produce no video stream
const SCRIPT: &str = r#"#!/bin/sh
if [ "$1" = "-hide_banner" ]; then
  case "$3" in
    *corrupt*)
      echo "$3: Invalid data found when processing input" >&2
      exit 1
      ;;
    *small*) DIM=640x480 ;;
    *) DIM=1920x1080 ;;
  esac
  cat >&2 <<OUT
Input #0, matroska,webm, from '$3':
  Duration: 00:42:10.00, start: 0.000000, bitrate: 2000 kb/s
    Stream #0:0(eng): Video: h264 (High), yuv420p(progressive), $DIM [SAR 1:1 DAR 16:9], 23.98 fps, 23.98 tbr, 1k tbn (default)
    Stream #0:1(eng): Audio: aac (LC), 48000 Hz, stereo, fltp (default)
At least one output file must be specified
OUT
  exit 1
fi

for last; do :; done
echo "transcoded" > "$last"
case "$last" in
  *broken*) exit 1 ;;
esac
exit 0
"#;

pub struct FakeFfmpeg {
    pub dir: TempDir,
    pub path: PathBuf,
}

impl FakeFfmpeg {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ffmpeg");
        fs::write(&path, SCRIPT).unwrap();
        make_executable(&path);
        Self { dir, path }
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) {}

/// Config text with one `hevc` profile, a SKIP rule for small files and a
/// catch-all rule.
pub fn config_toml(ffmpeg: &Path) -> String {
    format!(
        r#"
[config]
ffmpeg = "{}"
concurrent_jobs = 2
queue_capacity = 2

[profiles.hevc]
output_options = "-c:v libx265 -crf 22 -c:a copy"
extension = "mkv"

[profiles.mobile]
input_options = "-hwaccel auto"
output_options = "-c:v libx264 -vf scale=-2:480"
extension = "mp4"

[rules."small files"]
profile = "SKIP"
criteria = {{ res_height = "<720" }}

[rules."everything else"]
profile = "hevc"
"#,
        ffmpeg.display()
    )
}

/// Create an empty media file named `name` in `dir`.
pub fn touch(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, b"source").unwrap();
    path
}
