//! Transcode executor.
//!
//! Runs one job through `Queued -> Running -> Succeeded | Failed`. On success
//! the source is replaced by the output; on failure the provisional output is
//! removed and the source is left alone.

use crate::config::{Config, Profile};
use crate::queue::{CompletedSet, Job, JobExecutor};
use anyhow::{Context, Result};
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Per-run executor switches.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecutorOptions {
    /// Print the command and stop.
    pub dry_run: bool,
    /// Leave the source in place and the output under its provisional name.
    pub keep_source: bool,
}

/// Terminal state of one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Succeeded,
    Failed { reason: String },
    DryRun,
}

/// A fully built tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeCommand {
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl TranscodeCommand {
    /// `program <input_options> -i <input> <output_options> <output>`
    pub fn build(program: &Path, profile: &Profile, job: &Job) -> Self {
        let mut args: Vec<OsString> = Vec::new();
        args.extend(profile.input_args().into_iter().map(OsString::from));
        args.push("-i".into());
        args.push(job.input.clone().into_os_string());
        args.extend(profile.output_args().into_iter().map(OsString::from));
        args.push(job.output.clone().into_os_string());

        Self {
            program: program.to_path_buf(),
            args,
        }
    }

    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }
}

impl fmt::Display for TranscodeCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

pub struct TranscodeExecutor {
    config: Arc<Config>,
    completed: Arc<CompletedSet>,
    options: ExecutorOptions,
}

impl TranscodeExecutor {
    pub fn new(config: Arc<Config>, completed: Arc<CompletedSet>, options: ExecutorOptions) -> Self {
        Self {
            config,
            completed,
            options,
        }
    }

    /// Run a job to completion. Never panics on tool or filesystem errors.
    pub fn execute(&self, job: &Job) -> JobOutcome {
        let Some(profile) = self.config.profiles.get(&job.profile) else {
            error!("Profile '{}' not found for {}", job.profile, job.input.display());
            return JobOutcome::Failed {
                reason: format!("profile '{}' not found", job.profile),
            };
        };

        let command = TranscodeCommand::build(&self.config.config.ffmpeg, profile, job);
        println!("{} -->  {}", job.profile, command);

        if self.options.dry_run {
            return JobOutcome::DryRun;
        }

        info!("Transcoding {}", job.input.display());
        let reason = match command.to_command().status() {
            Ok(status) if status.success() => return self.succeed(job),
            Ok(status) => format!("{} exited with {}", command.program.display(), status),
            Err(e) => format!("failed to start {}: {}", command.program.display(), e),
        };

        self.fail(job, reason)
    }

    fn succeed(&self, job: &Job) -> JobOutcome {
        if self.options.keep_source {
            info!(
                "Keeping source {}; output left at {}",
                job.input.display(),
                job.output.display()
            );
        } else if let Err(e) = replace_source(job) {
            error!("{:#}", e);
        }

        self.completed.insert(job.input.clone());
        info!("Finished {}", job.input.display());
        JobOutcome::Succeeded
    }

    fn fail(&self, job: &Job, reason: String) -> JobOutcome {
        error!("Transcode of {} failed: {}", job.input.display(), reason);
        remove_provisional_output(&job.output);
        JobOutcome::Failed { reason }
    }
}

impl JobExecutor for TranscodeExecutor {
    fn execute(&self, job: &Job) -> JobOutcome {
        TranscodeExecutor::execute(self, job)
    }
}

/// Delete the source, then move the output to its final name.
fn replace_source(job: &Job) -> Result<()> {
    debug!("Removing {}", job.input.display());
    std::fs::remove_file(&job.input)
        .with_context(|| format!("Failed to remove source {}", job.input.display()))?;

    let final_output = job.final_output();
    debug!("Renaming {} -> {}", job.output.display(), final_output.display());
    std::fs::rename(&job.output, &final_output).with_context(|| {
        format!(
            "Failed to rename {} to {}",
            job.output.display(),
            final_output.display()
        )
    })?;

    Ok(())
}

fn remove_provisional_output(output: &Path) {
    match std::fs::remove_file(output) {
        Ok(()) => info!("Removed partial output {}", output.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove partial output {}: {}", output.display(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> Profile {
        Profile {
            input_options: "-hwaccel auto".to_string(),
            output_options: "-c:v libx265  -crf 22".to_string(),
            extension: "mkv".to_string(),
        }
    }

    #[test]
    fn test_command_shape() {
        let job = Job::new("/m/movie.avi", "hevc", &profile());
        let cmd = TranscodeCommand::build(Path::new("ffmpeg"), &profile(), &job);

        let args: Vec<_> = cmd.args.iter().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(
            args,
            [
                "-hwaccel",
                "auto",
                "-i",
                "/m/movie.avi",
                "-c:v",
                "libx265",
                "-crf",
                "22",
                "/m/movie.mkv.tmp"
            ]
        );
    }

    #[test]
    fn test_command_display() {
        let job = Job::new("/m/movie.avi", "hevc", &profile());
        let cmd = TranscodeCommand::build(Path::new("/usr/bin/ffmpeg"), &profile(), &job);
        assert_eq!(
            cmd.to_string(),
            "/usr/bin/ffmpeg -hwaccel auto -i /m/movie.avi -c:v libx265 -crf 22 /m/movie.mkv.tmp"
        );
    }

    #[test]
    fn test_empty_options() {
        let bare = Profile {
            input_options: String::new(),
            output_options: String::new(),
            extension: "mp4".to_string(),
        };
        let job = Job::new("/m/a.mkv", "bare", &bare);
        let cmd = TranscodeCommand::build(Path::new("ffmpeg"), &bare, &job);
        assert_eq!(cmd.to_string(), "ffmpeg -i /m/a.mkv /m/a.mp4.tmp");
    }

    #[test]
    fn test_unknown_profile_fails_without_panicking() {
        let executor = TranscodeExecutor::new(
            Arc::new(Config::default()),
            Arc::new(CompletedSet::new()),
            ExecutorOptions::default(),
        );
        let job = Job::new("/m/a.avi", "ghost", &profile());
        assert!(matches!(executor.execute(&job), JobOutcome::Failed { .. }));
    }
}
