use super::{Job, JobQueue};
use crate::executor::JobOutcome;
use anyhow::{Context, Result};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error};

/// Job counts for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub submitted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub dry_run: usize,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} queued, {} succeeded, {} failed",
            self.submitted, self.succeeded, self.failed
        )?;
        if self.dry_run > 0 {
            write!(f, ", {} dry-run", self.dry_run)?;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Counters {
    succeeded: AtomicUsize,
    failed: AtomicUsize,
    dry_run: AtomicUsize,
}

impl Counters {
    fn record(&self, outcome: &JobOutcome) {
        let counter = match outcome {
            JobOutcome::Succeeded => &self.succeeded,
            JobOutcome::Failed { .. } => &self.failed,
            JobOutcome::DryRun => &self.dry_run,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Runs one job to its terminal outcome on a worker thread.
pub trait JobExecutor: Send + Sync + 'static {
    fn execute(&self, job: &Job) -> JobOutcome;
}

/// Worker threads draining a [`JobQueue`] through a [`JobExecutor`].
///
/// Workers are started on demand by [`WorkerPool::submit`], never more than
/// `max_workers` and never more than the number of jobs submitted.
pub struct WorkerPool {
    queue: Arc<JobQueue>,
    executor: Arc<dyn JobExecutor>,
    counters: Arc<Counters>,
    workers: Vec<JoinHandle<()>>,
    max_workers: usize,
    submitted: usize,
}

impl WorkerPool {
    pub fn new(executor: impl JobExecutor, max_workers: usize, capacity: usize) -> Self {
        Self {
            queue: Arc::new(JobQueue::new(capacity)),
            executor: Arc::new(executor),
            counters: Arc::new(Counters::default()),
            workers: Vec::new(),
            max_workers: max_workers.max(1),
            submitted: 0,
        }
    }

    /// Queue a job, blocking while the queue is full.
    pub fn submit(&mut self, job: Job) -> Result<()> {
        if self.workers.len() < self.max_workers {
            self.spawn_worker()?;
        }
        self.queue.push(job)?;
        self.submitted += 1;
        Ok(())
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    fn spawn_worker(&mut self) -> Result<()> {
        let id = self.workers.len() + 1;
        let queue = Arc::clone(&self.queue);
        let executor = Arc::clone(&self.executor);
        let counters = Arc::clone(&self.counters);

        let handle = thread::Builder::new()
            .name(format!("transcode-{}", id))
            .spawn(move || worker_loop(id, &queue, executor.as_ref(), &counters))
            .with_context(|| format!("Failed to start worker thread {}", id))?;

        self.workers.push(handle);
        Ok(())
    }

    /// Close the queue, wait for every job and worker, and report the counts.
    pub fn finish(self) -> RunSummary {
        self.queue.close();
        self.queue.join();

        for handle in self.workers {
            if handle.join().is_err() {
                error!("Worker thread panicked");
            }
        }

        RunSummary {
            submitted: self.submitted,
            succeeded: self.counters.succeeded.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
            dry_run: self.counters.dry_run.load(Ordering::Relaxed),
        }
    }
}

fn worker_loop(id: usize, queue: &JobQueue, executor: &dyn JobExecutor, counters: &Counters) {
    debug!("Worker {} started", id);

    while let Some(job) = queue.pop() {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| executor.execute(&job)))
            .unwrap_or_else(|_| {
                error!("Transcode of {} panicked", job.input.display());
                JobOutcome::Failed {
                    reason: "executor panicked".to_string(),
                }
            });

        counters.record(&outcome);
        queue.task_done();
    }

    debug!("Worker {} exiting", id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Profile;
    use std::sync::atomic::AtomicUsize;

    fn profile() -> Profile {
        Profile {
            input_options: String::new(),
            output_options: String::new(),
            extension: "mkv".to_string(),
        }
    }

    fn job(name: &str) -> Job {
        Job::new(format!("/m/{}", name), "hevc", &profile())
    }

    /// Succeeds on every job except those named `panic*`.
    #[derive(Default)]
    struct Scripted {
        runs: Arc<AtomicUsize>,
    }

    impl JobExecutor for Scripted {
        fn execute(&self, job: &Job) -> JobOutcome {
            self.runs.fetch_add(1, Ordering::SeqCst);
            let name = job.input.file_name().unwrap().to_string_lossy();
            if name.starts_with("panic") {
                panic!("executor blew up on {}", name);
            }
            JobOutcome::Succeeded
        }
    }

    #[test]
    fn test_panicking_job_counts_as_failed() {
        let executor = Scripted::default();
        let runs = Arc::clone(&executor.runs);
        let mut pool = WorkerPool::new(executor, 2, 1);

        for name in ["a.avi", "panic.avi", "b.avi", "c.avi"] {
            pool.submit(job(name)).unwrap();
        }
        let summary = pool.finish();

        assert_eq!(summary.submitted, 4);
        assert_eq!(summary.succeeded, 3);
        assert_eq!(summary.failed, 1);
        assert_eq!(runs.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_single_worker_survives_panic() {
        let mut pool = WorkerPool::new(Scripted::default(), 1, 4);

        pool.submit(job("panic1.avi")).unwrap();
        pool.submit(job("panic2.avi")).unwrap();
        pool.submit(job("ok.avi")).unwrap();

        assert_eq!(pool.worker_count(), 1);
        let summary = pool.finish();
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.succeeded, 1);
    }

    #[test]
    fn test_summary_display() {
        let summary = RunSummary {
            submitted: 3,
            succeeded: 1,
            failed: 0,
            dry_run: 2,
        };
        assert_eq!(summary.to_string(), "3 queued, 1 succeeded, 0 failed, 2 dry-run");
    }
}
