/*!
 * Worker Pools
 *
 * Where offloaded work runs. The pool is supplied by the host; two
 * implementations are provided:
 * - `ThreadPool`: fixed named threads fed by a bounded channel
 * - `TokioBlockingPool`: a tokio runtime's blocking pool
 */

use crate::core::errors::{ResilienceError, ResilienceResult};
use crate::core::limits::{DEFAULT_POOL_QUEUE, DEFAULT_POOL_THREADS, POOL_THREAD_PREFIX};
use parking_lot::Mutex;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

/// Unit of work submitted to a pool
pub type Job = Box<dyn FnOnce() + Send>;

/// Executor for offloaded work
pub trait WorkerPool: Send + Sync {
    /// Submit a job without blocking
    ///
    /// # Errors
    ///
    /// `SchedulingFailed` when the pool is saturated or shut down. A pool
    /// that accepts a job and later drops it unrun must still drop it: the
    /// job's destructor reports the loss to whoever waits on it.
    fn submit(&self, job: Job) -> ResilienceResult<()>;
}

/// Fixed-size thread pool
pub struct ThreadPool {
    sender: Mutex<Option<flume::Sender<Job>>>,
    threads: Mutex<Vec<JoinHandle<()>>>,
}

impl ThreadPool {
    /// Spawn `threads` workers behind a queue of `queue` jobs
    pub fn new(threads: usize, queue: usize) -> ResilienceResult<Self> {
        let (sender, receiver) = flume::bounded::<Job>(queue.max(1));
        let mut handles = Vec::with_capacity(threads.max(1));

        for index in 0..threads.max(1) {
            let receiver = receiver.clone();
            let handle = thread::Builder::new()
                .name(format!("{}-{}", POOL_THREAD_PREFIX, index))
                .spawn(move || {
                    while let Ok(job) = receiver.recv() {
                        if catch_unwind(AssertUnwindSafe(job)).is_err() {
                            warn!("Offloaded job panicked; worker continues");
                        }
                    }
                })
                .map_err(|e| ResilienceError::scheduling(format!("failed to spawn pool worker: {}", e)))?;
            handles.push(handle);
        }

        Ok(Self {
            sender: Mutex::new(Some(sender)),
            threads: Mutex::new(handles),
        })
    }

    pub fn with_defaults() -> ResilienceResult<Self> {
        Self::new(DEFAULT_POOL_THREADS, DEFAULT_POOL_QUEUE)
    }

    /// Stop accepting jobs, let queued jobs finish, join the workers
    pub fn shutdown(&self) {
        self.sender.lock().take();

        let handles = std::mem::take(&mut *self.threads.lock());
        if handles.is_empty() {
            return;
        }
        let current = thread::current().id();
        for handle in handles {
            if handle.thread().id() == current {
                continue;
            }
            if handle.join().is_err() {
                warn!("Pool worker panicked during shutdown");
            }
        }
        debug!("Worker pool stopped");
    }
}

impl WorkerPool for ThreadPool {
    fn submit(&self, job: Job) -> ResilienceResult<()> {
        let sender = self.sender.lock();
        let Some(sender) = sender.as_ref() else {
            return Err(ResilienceError::scheduling("worker pool is shut down"));
        };
        sender.try_send(job).map_err(|e| match e {
            flume::TrySendError::Full(_) => ResilienceError::scheduling("worker pool queue is full"),
            flume::TrySendError::Disconnected(_) => {
                ResilienceError::scheduling("worker pool is shut down")
            }
        })
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Adapter running jobs on a tokio runtime's blocking pool
#[derive(Clone)]
pub struct TokioBlockingPool {
    handle: tokio::runtime::Handle,
}

impl TokioBlockingPool {
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        Self { handle }
    }

    /// Use the runtime the caller is running on
    pub fn current() -> ResilienceResult<Self> {
        tokio::runtime::Handle::try_current()
            .map(Self::new)
            .map_err(|e| ResilienceError::scheduling(format!("no tokio runtime: {}", e)))
    }
}

impl WorkerPool for TokioBlockingPool {
    fn submit(&self, job: Job) -> ResilienceResult<()> {
        // Dropping the JoinHandle detaches the task. Completion, or the job
        // being dropped by a runtime shutting down, is reported by the job.
        drop(self.handle.spawn_blocking(job));
        Ok(())
    }
}
