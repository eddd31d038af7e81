//! Transforge - rule-driven batch transcoding
//!
//! Files are probed, matched against ordered rules to pick a transcode
//! profile, and run through a bounded queue drained by worker threads.
//! A pending-file list is rewritten after each run so interrupted batches
//! resume where they stopped.

pub mod config;
pub mod discover;
pub mod executor;
pub mod notifications;
pub mod pending;
pub mod queue;
pub mod rules;
pub mod runner;

pub use transforge_av::{FfmpegProber, MediaAttributes, Prober};
