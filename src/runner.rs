//! One batch run: inputs in, jobs through the pool, pending file reconciled.

use crate::config::Config;
use crate::discover::expand_input;
use crate::executor::{ExecutorOptions, TranscodeExecutor};
use crate::pending::{reconcile_pending, PendingOutcome};
use crate::queue::{CompletedSet, Job, RunSummary, WorkerPool};
use crate::rules::Verdict;
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use transforge_av::{resolve_tool, Prober};

/// A path to process, optionally with a profile forced by `-p`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    pub path: PathBuf,
    pub profile: Option<String>,
}

impl InputFile {
    pub fn new(path: impl Into<PathBuf>, profile: Option<String>) -> Self {
        Self {
            path: path.into(),
            profile,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub dry_run: bool,
    pub keep_source: bool,
    /// Use a single worker regardless of `concurrent_jobs`.
    pub sequential: bool,
}

/// What to do with one input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Transcode(Job),
    Skip { rule: String },
    NoMatch,
    /// Attributes could not be determined.
    Unprobed,
}

/// Everything that happened during a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub jobs: RunSummary,
    pub skipped: usize,
    pub unmatched: usize,
    pub unprobed: usize,
    pub missing: usize,
    pub pending: Option<PendingOutcome>,
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}; {} skipped, {} unmatched",
            self.jobs, self.skipped, self.unmatched
        )?;
        if self.unprobed > 0 {
            write!(f, ", {} unreadable", self.unprobed)?;
        }
        if self.missing > 0 {
            write!(f, ", {} missing", self.missing)?;
        }
        Ok(())
    }
}

/// Inputs after directory expansion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Collected {
    /// Files to process, absolute and deduplicated.
    pub files: Vec<InputFile>,
    /// Inputs that did not exist.
    pub missing: usize,
    /// Each directory input with every file discovered under it.
    pub directories: Vec<(PathBuf, Vec<PathBuf>)>,
}

impl Collected {
    /// Mark directories whose discovered files are all completed.
    fn complete_directories(&self, completed: &CompletedSet) {
        for (dir, files) in &self.directories {
            if files.iter().all(|f| completed.contains(f)) {
                debug!("Everything under {} is done", dir.display());
                completed.insert(dir.clone());
            }
        }
    }
}

pub struct Runner {
    config: Arc<Config>,
    prober: Arc<dyn Prober>,
    options: RunOptions,
}

impl Runner {
    pub fn new(config: Arc<Config>, prober: Arc<dyn Prober>, options: RunOptions) -> Self {
        Self {
            config,
            prober,
            options,
        }
    }

    /// Process `inputs`. When they came from a pending file, pass it as
    /// `queue_file` so it can be reconciled afterwards.
    pub fn run(&self, inputs: Vec<InputFile>, queue_file: Option<&Path>) -> Result<RunReport> {
        self.check_forced_profiles(&inputs)?;

        if let Err(e) = resolve_tool(&self.config.config.ffmpeg) {
            warn!("{}; every probe and transcode will fail", e);
        }

        let mut report = RunReport::default();
        let collected = self.collect(inputs);
        report.missing = collected.missing;

        let completed = Arc::new(CompletedSet::new());
        let executor = TranscodeExecutor::new(
            Arc::clone(&self.config),
            Arc::clone(&completed),
            ExecutorOptions {
                dry_run: self.options.dry_run,
                keep_source: self.options.keep_source,
            },
        );
        let mut pool = WorkerPool::new(executor, self.worker_limit(), self.config.config.queue_capacity);

        for input in &collected.files {
            match self.decide(input) {
                Decision::Transcode(job) => pool.submit(job)?,
                Decision::Skip { rule } => {
                    info!("Skipping {} due to rule '{}'", input.path.display(), rule);
                    completed.insert(input.path.clone());
                    report.skipped += 1;
                }
                Decision::NoMatch => {
                    info!("No matching profile for {}, skipped", input.path.display());
                    report.unmatched += 1;
                }
                Decision::Unprobed => {
                    report.unprobed += 1;
                }
            }
        }

        report.jobs = pool.finish();
        collected.complete_directories(&completed);

        if let Some(queue_file) = queue_file {
            if self.options.dry_run {
                debug!("Dry run, leaving {} untouched", queue_file.display());
            } else {
                let outcome = reconcile_pending(queue_file, &completed.snapshot())
                    .with_context(|| format!("Failed to update {}", queue_file.display()))?;
                report.pending = Some(outcome);
            }
        }

        Ok(report)
    }

    /// Forced profiles must exist before any work starts.
    pub fn check_forced_profiles(&self, inputs: &[InputFile]) -> Result<()> {
        for profile in inputs.iter().filter_map(|i| i.profile.as_deref()) {
            if !self.config.profiles.contains_key(profile) {
                anyhow::bail!("Profile '{}' referenced from command line not found", profile);
            }
        }
        Ok(())
    }

    /// Expand directories, drop missing paths and duplicates.
    ///
    /// Returned paths are absolute. The first occurrence of a path keeps its
    /// forced profile.
    pub fn collect(&self, inputs: Vec<InputFile>) -> Collected {
        let mut seen = HashSet::new();
        let mut collected = Collected::default();

        for input in inputs {
            if input.path.as_os_str().is_empty() {
                continue;
            }
            if !input.path.exists() {
                warn!("{} not found, skipping", input.path.display());
                collected.missing += 1;
                continue;
            }

            let expanded: Vec<PathBuf> = expand_input(&input.path, &self.config.config.extensions)
                .into_iter()
                .map(|path| std::path::absolute(&path).unwrap_or(path))
                .collect();

            for path in &expanded {
                if seen.insert(path.clone()) {
                    collected
                        .files
                        .push(InputFile::new(path, input.profile.clone()));
                } else {
                    debug!("Ignoring duplicate input {}", path.display());
                }
            }

            if input.path.is_dir() {
                let dir = std::path::absolute(&input.path).unwrap_or(input.path);
                collected.directories.push((dir, expanded));
            }
        }

        collected
    }

    /// Pick a profile for one file: forced, by rule, or none.
    pub fn decide(&self, input: &InputFile) -> Decision {
        if let Some(name) = &input.profile {
            return match self.config.profiles.get(name) {
                Some(profile) => Decision::Transcode(Job::new(&input.path, name, profile)),
                None => Decision::NoMatch,
            };
        }

        let attrs = self.prober.probe_or_unknown(&input.path);
        if !attrs.is_known() {
            warn!("Could not read media attributes of {}, skipped", input.path.display());
            return Decision::Unprobed;
        }

        match self.config.matcher.verdict(&input.path, &attrs) {
            Verdict::Transcode { profile, rule } => {
                debug!("{} matched rule '{}'", input.path.display(), rule);
                match self.config.profiles.get(profile) {
                    Some(p) => Decision::Transcode(Job::new(&input.path, profile, p)),
                    None => Decision::NoMatch,
                }
            }
            Verdict::Skip { rule } => Decision::Skip {
                rule: rule.to_string(),
            },
            Verdict::NoMatch => Decision::NoMatch,
        }
    }

    fn worker_limit(&self) -> usize {
        if self.options.sequential {
            1
        } else {
            self.config.config.concurrent_jobs
        }
    }
}
