//! ffmpeg-based media probing.
//!
//! Runs `ffmpeg -i <file>` without an output and extracts the attributes from
//! the stream summary it prints on stderr.

use super::types::MediaAttributes;
use crate::{Error, Result};
use regex::Regex;
use std::path::Path;
use std::process::Command;
use std::sync::LazyLock;

static DURATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Duration: (\d+):(\d+):\d+").expect("valid duration regex"));

static VIDEO_STREAM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*Stream #\d+:\d+.*?: Video: (\w+)(.*)$").expect("valid stream regex")
});

static DIMENSIONS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r", (\d+)x(\d+)").expect("valid dimensions regex"));

static FPS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:\.\d+)?) fps").expect("valid fps regex"));

/// Probe a media file by running the given ffmpeg executable against it.
pub fn probe_with_ffmpeg(executable: &Path, path: &Path) -> Result<MediaAttributes> {
    let metadata = std::fs::metadata(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::file_not_found(path)
        } else {
            Error::Io(e)
        }
    })?;

    // ffmpeg exits non-zero when no output file is given, so the exit status
    // carries no information here.
    let output = Command::new(executable)
        .args(["-hide_banner", "-i"])
        .arg(path)
        .output()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::tool_not_found(executable.display().to_string())
            } else {
                Error::Io(e)
            }
        })?;

    let stderr = String::from_utf8_lossy(&output.stderr);
    if !output.status.success() && !stderr.contains("Input #") {
        let message = stderr
            .lines()
            .rev()
            .find(|line| !line.trim().is_empty())
            .unwrap_or("no output");
        return Err(Error::tool_failed("ffmpeg", message.trim()));
    }

    parse_ffmpeg_output(&stderr, metadata.len())
}

/// Extract media attributes from ffmpeg's diagnostic output.
///
/// The first video stream supplies codec, dimensions and frame rate. Duration
/// and frame rate default to 0 when absent; a missing video stream or missing
/// dimensions is a parse error.
pub fn parse_ffmpeg_output(output: &str, file_size: u64) -> Result<MediaAttributes> {
    let stream = VIDEO_STREAM_RE
        .captures(output)
        .ok_or_else(|| Error::parse_error("ffmpeg", "no video stream found"))?;

    let codec = stream[1].to_string();
    let details = stream.get(2).map_or("", |m| m.as_str());

    let dims = DIMENSIONS_RE.captures(details).ok_or_else(|| {
        Error::parse_error("ffmpeg", format!("no resolution in video stream: {}", details))
    })?;
    let res_width = parse_number(&dims[1])?;
    let res_height = parse_number(&dims[2])?;

    let fps = FPS_RE
        .captures(details)
        .and_then(|c| c[1].parse::<f64>().ok())
        .map(|f| f.round() as u32)
        .unwrap_or(0);

    let runtime_minutes = match DURATION_RE.captures(output) {
        Some(c) => {
            let hours = parse_number(&c[1])?;
            let minutes = parse_number(&c[2])?;
            hours
                .checked_mul(60)
                .and_then(|m| m.checked_add(minutes))
                .ok_or_else(|| {
                    Error::parse_error("ffmpeg", format!("duration out of range: {}", &c[0]))
                })?
        }
        None => 0,
    };

    Ok(MediaAttributes {
        video_codec: Some(codec),
        res_height,
        res_width,
        runtime_minutes,
        source_size_mb: MediaAttributes::megabytes(file_size),
        fps,
    })
}

fn parse_number(s: &str) -> Result<u32> {
    s.parse()
        .map_err(|_| Error::parse_error("ffmpeg", format!("number out of range: {}", s)))
}
