// Shared worker pool for count and facet tasks
// One FIFO job queue feeding a fixed set of named worker threads

use crate::{Error, Result};
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread;
use tracing::debug;

/// A unit of work run on a pool thread
pub type Job = Box<dyn FnOnce() + Send + 'static>;

struct Shared {
    jobs: Mutex<VecDeque<Job>>,
    condvar: Condvar,
    running: AtomicBool,
    submitted: AtomicU64,
}

/// Fixed-size pool of worker threads.
///
/// Submission never blocks; jobs queue up until a worker is free.
pub struct WorkerPool {
    shared: Arc<Shared>,
    threads: usize,
}

impl WorkerPool {
    /// Spawn `threads` workers (at least one)
    pub fn new(threads: usize) -> Result<Self> {
        let threads = threads.max(1);
        let shared = Arc::new(Shared {
            jobs: Mutex::new(VecDeque::new()),
            condvar: Condvar::new(),
            running: AtomicBool::new(true),
            submitted: AtomicU64::new(0),
        });

        for worker_id in 0..threads {
            let shared = shared.clone();
            thread::Builder::new()
                .name(format!("relgraph-worker-{}", worker_id))
                .spawn(move || worker_loop(&shared))?;
        }
        debug!("Started worker pool with {} threads", threads);

        Ok(Self { shared, threads })
    }

    /// Pool sized to the machine's available parallelism
    pub fn with_default_size() -> Result<Self> {
        Self::new(default_threads())
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Queue a job. Fails only after `shutdown`.
    pub fn submit(&self, job: Job) -> Result<()> {
        if !self.shared.running.load(Ordering::Acquire) {
            return Err(Error::PoolShutdown);
        }
        self.shared.submitted.fetch_add(1, Ordering::Relaxed);
        let mut jobs = self.shared.jobs.lock();
        jobs.push_back(job);
        self.shared.condvar.notify_one();
        Ok(())
    }

    /// Total jobs accepted by `submit`
    pub fn jobs_submitted(&self) -> u64 {
        self.shared.submitted.load(Ordering::Relaxed)
    }

    /// Stop accepting jobs; workers drain the queue and exit
    pub fn shutdown(&self) {
        self.shared.running.store(false, Ordering::Release);
        let _guard = self.shared.jobs.lock();
        self.shared.condvar.notify_all();
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(shared: &Shared) {
    loop {
        let job = {
            let mut jobs = shared.jobs.lock();
            while jobs.is_empty() && shared.running.load(Ordering::Acquire) {
                shared.condvar.wait(&mut jobs);
            }
            match jobs.pop_front() {
                Some(job) => job,
                None => break,
            }
        };
        // A panicking job must not take the worker down with it
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(job));
    }
}

fn default_threads() -> usize {
    thread::available_parallelism().map(|n| n.get()).unwrap_or(4)
}

static WORKER_POOL: OnceLock<Arc<WorkerPool>> = OnceLock::new();

/// Process-wide pool, created on first use
pub fn global_pool() -> Result<Arc<WorkerPool>> {
    if let Some(pool) = WORKER_POOL.get() {
        return Ok(pool.clone());
    }
    let pool = Arc::new(WorkerPool::with_default_size()?);
    Ok(WORKER_POOL.get_or_init(|| pool).clone())
}
