//! Bounded job queue and the worker pool draining it.
//!
//! The producer (the main thread) blocks in [`JobQueue::push`] while the
//! queue is full; workers block in [`JobQueue::pop`] while it is empty.
//! [`JobQueue::join`] waits until every pushed job has been marked done.

mod completed;
mod job;
mod pool;

pub use completed::CompletedSet;
pub use job::{output_path, Job, TEMP_SUFFIX};
pub use pool::{JobExecutor, RunSummary, WorkerPool};

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;

/// Default number of jobs waiting in the queue.
pub const DEFAULT_CAPACITY: usize = 10;

/// Returned by [`JobQueue::push`] after [`JobQueue::close`].
#[derive(Debug, thiserror::Error)]
#[error("job queue is closed; {} not queued", .0.input.display())]
pub struct QueueClosed(pub Job);

#[derive(Debug, Default)]
struct QueueState {
    jobs: VecDeque<Job>,
    /// Pushed but not yet marked done.
    unfinished: usize,
    closed: bool,
}

/// Bounded, blocking FIFO of transcode jobs.
#[derive(Debug)]
pub struct JobQueue {
    state: Mutex<QueueState>,
    not_empty: Condvar,
    not_full: Condvar,
    all_done: Condvar,
    capacity: usize,
}

impl JobQueue {
    /// Create a queue holding at most `capacity` waiting jobs (minimum 1).
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            all_done: Condvar::new(),
            capacity: capacity.max(1),
        }
    }

    /// Append a job, blocking while the queue is full.
    pub fn push(&self, job: Job) -> Result<(), QueueClosed> {
        let mut state = self.state.lock();
        while state.jobs.len() >= self.capacity && !state.closed {
            self.not_full.wait(&mut state);
        }
        if state.closed {
            return Err(QueueClosed(job));
        }

        state.jobs.push_back(job);
        state.unfinished += 1;
        self.not_empty.notify_one();
        Ok(())
    }

    /// Take the oldest job, blocking while the queue is empty.
    ///
    /// Returns `None` once the queue is closed and drained.
    pub fn pop(&self) -> Option<Job> {
        let mut state = self.state.lock();
        loop {
            if let Some(job) = state.jobs.pop_front() {
                self.not_full.notify_one();
                return Some(job);
            }
            if state.closed {
                return None;
            }
            self.not_empty.wait(&mut state);
        }
    }

    /// Mark one popped job as finished.
    pub fn task_done(&self) {
        let mut state = self.state.lock();
        state.unfinished = state.unfinished.saturating_sub(1);
        if state.unfinished == 0 {
            self.all_done.notify_all();
        }
    }

    /// Block until every pushed job has been marked done.
    pub fn join(&self) {
        let mut state = self.state.lock();
        while state.unfinished > 0 {
            self.all_done.wait(&mut state);
        }
    }

    /// Stop accepting jobs. Waiting workers drain what is left, then see `None`.
    pub fn close(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    pub fn len(&self) -> usize {
        self.state.lock().jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn unfinished(&self) -> usize {
        self.state.lock().unfinished
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for JobQueue {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    fn job(name: &str) -> Job {
        Job {
            input: format!("/m/{}.avi", name).into(),
            output: format!("/m/{}.mkv.tmp", name).into(),
            profile: "hevc".to_string(),
        }
    }

    #[test]
    fn test_fifo_order() {
        let queue = JobQueue::new(4);
        for name in ["a", "b", "c"] {
            queue.push(job(name)).unwrap();
        }
        queue.close();

        let order: Vec<_> = std::iter::from_fn(|| queue.pop())
            .map(|j| j.input)
            .collect();
        assert_eq!(
            order,
            ["/m/a.avi", "/m/b.avi", "/m/c.avi"]
                .iter()
                .map(std::path::PathBuf::from)
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_push_blocks_when_full() {
        let queue = Arc::new(JobQueue::new(1));
        queue.push(job("first")).unwrap();

        let pushed = Arc::new(AtomicBool::new(false));
        let producer = {
            let queue = Arc::clone(&queue);
            let pushed = Arc::clone(&pushed);
            thread::spawn(move || {
                queue.push(job("second")).unwrap();
                pushed.store(true, Ordering::SeqCst);
            })
        };

        thread::sleep(Duration::from_millis(100));
        assert!(!pushed.load(Ordering::SeqCst), "push should block while full");

        assert_eq!(queue.pop().unwrap().input, job("first").input);
        producer.join().unwrap();
        assert!(pushed.load(Ordering::SeqCst));
        assert_eq!(queue.pop().unwrap().input, job("second").input);
    }

    #[test]
    fn test_pop_none_after_close() {
        let queue = Arc::new(JobQueue::new(2));
        let consumer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.pop())
        };
        thread::sleep(Duration::from_millis(50));
        queue.close();
        assert!(consumer.join().unwrap().is_none());
    }

    #[test]
    fn test_push_after_close_rejected() {
        let queue = JobQueue::new(2);
        queue.close();
        let err = queue.push(job("late")).unwrap_err();
        assert_eq!(err.0.profile, "hevc");
        assert!(err.to_string().contains("late.avi"));
    }

    #[test]
    fn test_join_waits_for_task_done() {
        let queue = Arc::new(JobQueue::new(2));
        queue.push(job("a")).unwrap();
        queue.push(job("b")).unwrap();
        assert_eq!(queue.unfinished(), 2);

        let worker = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                while let Some(_job) = queue.pop() {
                    thread::sleep(Duration::from_millis(20));
                    queue.task_done();
                }
            })
        };

        queue.join();
        assert_eq!(queue.unfinished(), 0);
        queue.close();
        worker.join().unwrap();
    }

    #[test]
    fn test_zero_capacity_clamped() {
        assert_eq!(JobQueue::new(0).capacity(), 1);
    }
}
