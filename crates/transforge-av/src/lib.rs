//! # transforge-av
//!
//! Media probing and external tool helpers for transforge.
//!
//! This crate provides functionality for:
//! - Probing media files to extract the attributes transcode rules match on
//!   (codec, resolution, runtime, size, frame rate)
//! - Locating the external tools the transcodes are delegated to
//!
//! ## Example
//!
//! ```no_run
//! use transforge_av::{FfmpegProber, Prober};
//! use std::path::Path;
//!
//! let prober = FfmpegProber::new("/usr/bin/ffmpeg");
//! let attrs = prober.probe(Path::new("/path/to/video.mkv"))?;
//! println!("{:?} {}x{}", attrs.video_codec, attrs.res_width, attrs.res_height);
//! # Ok::<(), transforge_av::Error>(())
//! ```

mod error;
pub mod probe;
pub mod tools;

// Re-exports
pub use error::{Error, Result};
pub use probe::{FfmpegProber, MediaAttributes, Prober};
pub use tools::{require_tool, resolve_tool};
