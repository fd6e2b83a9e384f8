/*!
 * Timer Service
 *
 * Process-wide scheduler of deferred callbacks ("watches") shared by every
 * timeout strategy, so concurrent timeouts cost heap entries, not threads.
 *
 * ## Structure
 *
 * - Min-heap of `(deadline, id)` for nearest-deadline extraction
 * - Map `id -> callback` for O(1) cancellation; cancelled ids stay in the
 *   heap as tombstones and are skipped (or compacted away)
 * - One driver thread sleeping until the nearest deadline
 * - A small pool of workers running fired callbacks, fed over a channel,
 *   so callbacks never run under the heap lock
 */

use super::config::TimerConfig;
use super::entry::WatchEntry;
use crate::core::errors::{ResilienceError, ResilienceResult};
use crate::core::limits::TIMER_COMPACTION_MIN_HEAP;
use ahash::HashMap;
use parking_lot::{Condvar, Mutex};
use std::collections::BinaryHeap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

type Callback = Box<dyn FnOnce() + Send>;

struct TimerState {
    heap: BinaryHeap<WatchEntry>,
    pending: HashMap<u64, Callback>,
    running: bool,
}

impl TimerState {
    fn compact_if_sparse(&mut self) {
        let TimerState { heap, pending, .. } = self;
        if heap.len() >= TIMER_COMPACTION_MIN_HEAP && heap.len() > pending.len() * 2 {
            heap.retain(|entry| pending.contains_key(&entry.id));
        }
    }
}

struct Shared {
    state: Mutex<TimerState>,
    wakeup: Condvar,
    next_id: AtomicU64,
    max_pending: usize,
    scheduled: AtomicU64,
    fired: AtomicU64,
    cancelled: AtomicU64,
}

/// Timer statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimerStats {
    pub scheduled: u64,
    pub fired: u64,
    pub cancelled: u64,
    pub pending: usize,
}

/// Shared timer service
///
/// Created once by whatever assembles strategy chains and handed to every
/// timeout strategy behind an `Arc`. Stopped by [`TimerService::shutdown`]
/// or on drop.
pub struct TimerService {
    shared: Arc<Shared>,
    threads: Mutex<Vec<JoinHandle<()>>>,
}

impl TimerService {
    /// Start the driver and callback workers
    pub fn start(config: TimerConfig) -> ResilienceResult<Self> {
        let shared = Arc::new(Shared {
            state: Mutex::new(TimerState {
                heap: BinaryHeap::new(),
                pending: HashMap::default(),
                running: true,
            }),
            wakeup: Condvar::new(),
            next_id: AtomicU64::new(1),
            max_pending: config.max_pending,
            scheduled: AtomicU64::new(0),
            fired: AtomicU64::new(0),
            cancelled: AtomicU64::new(0),
        });

        let (dispatch, jobs) = flume::unbounded::<Callback>();
        let mut threads = Vec::with_capacity(config.effective_workers() + 1);

        for index in 0..config.effective_workers() {
            let jobs = jobs.clone();
            let handle = thread::Builder::new()
                .name(format!("{}-worker-{}", config.thread_name_prefix, index))
                .spawn(move || run_worker(jobs))
                .map_err(|e| ResilienceError::scheduling(format!("failed to spawn timer worker: {}", e)))?;
            threads.push(handle);
        }

        let driver_shared = Arc::clone(&shared);
        let driver = thread::Builder::new()
            .name(format!("{}-driver", config.thread_name_prefix))
            .spawn(move || run_driver(driver_shared, dispatch))
            .map_err(|e| ResilienceError::scheduling(format!("failed to spawn timer driver: {}", e)))?;
        threads.push(driver);

        debug!(workers = config.effective_workers(), "Timer service started");

        Ok(Self {
            shared,
            threads: Mutex::new(threads),
        })
    }

    /// Start with default configuration
    pub fn with_defaults() -> ResilienceResult<Self> {
        Self::start(TimerConfig::default())
    }

    /// Schedule `callback` to run once `delay` has elapsed
    ///
    /// A delay too large to express as an `Instant` yields a task that never
    /// fires; the callback is dropped unrun.
    ///
    /// # Errors
    ///
    /// `SchedulingFailed` if the service is shut down or already holds
    /// `max_pending` live watches.
    pub fn schedule<F>(&self, delay: Duration, callback: F) -> ResilienceResult<TimerTask>
    where
        F: FnOnce() + Send + 'static,
    {
        let deadline = Instant::now().checked_add(delay);
        let id = {
            let mut state = self.shared.state.lock();
            if !state.running {
                return Err(ResilienceError::scheduling("timer service is shut down"));
            }

            // A deadline past the representable range never fires
            let Some(deadline) = deadline else {
                let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
                trace!(id, "Watch beyond the clock range, not armed");
                return Ok(TimerTask {
                    id,
                    shared: Arc::downgrade(&self.shared),
                });
            };
            if state.pending.len() >= self.shared.max_pending {
                return Err(ResilienceError::scheduling(format!(
                    "timer service at capacity ({} pending watches)",
                    self.shared.max_pending
                )));
            }

            let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
            let is_earliest = state
                .heap
                .peek()
                .map_or(true, |top| deadline < top.deadline);

            state.heap.push(WatchEntry { deadline, id });
            state.pending.insert(id, Box::new(callback));

            if is_earliest {
                self.shared.wakeup.notify_one();
            }
            id
        };

        self.shared.scheduled.fetch_add(1, Ordering::Relaxed);
        trace!(id, delay_ms = delay.as_millis() as u64, "Watch scheduled");

        Ok(TimerTask {
            id,
            shared: Arc::downgrade(&self.shared),
        })
    }

    /// Live (scheduled, not yet fired or cancelled) watches
    pub fn pending(&self) -> usize {
        self.shared.state.lock().pending.len()
    }

    pub fn is_running(&self) -> bool {
        self.shared.state.lock().running
    }

    pub fn stats(&self) -> TimerStats {
        TimerStats {
            scheduled: self.shared.scheduled.load(Ordering::Relaxed),
            fired: self.shared.fired.load(Ordering::Relaxed),
            cancelled: self.shared.cancelled.load(Ordering::Relaxed),
            pending: self.pending(),
        }
    }

    /// Stop the service
    ///
    /// Pending watches are dropped without firing, so whatever they guarded
    /// is left to settle on its own. Callbacks already handed to workers
    /// still run. New watches are refused. Idempotent.
    pub fn shutdown(&self) {
        let drained = {
            let mut state = self.shared.state.lock();
            state.running = false;
            state.heap.clear();
            std::mem::take(&mut state.pending)
        };
        self.shared.wakeup.notify_all();

        let dropped = drained.len();
        drop(drained);

        let handles = std::mem::take(&mut *self.threads.lock());
        if handles.is_empty() {
            return;
        }

        let current = thread::current().id();
        for handle in handles {
            // A callback may shut the service down from a worker thread
            if handle.thread().id() == current {
                continue;
            }
            if handle.join().is_err() {
                warn!("Timer thread panicked during shutdown");
            }
        }

        debug!(dropped_watches = dropped, "Timer service stopped");
    }
}

impl Drop for TimerService {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for TimerService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerService")
            .field("stats", &self.stats())
            .finish()
    }
}

/// Handle to one scheduled watch
#[derive(Debug, Clone)]
pub struct TimerTask {
    id: u64,
    shared: Weak<Shared>,
}

impl TimerTask {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Cancel the watch
    ///
    /// Returns `true` if the watch was removed before firing. `false` means
    /// it already fired (or is firing), was cancelled, or the service is gone.
    pub fn cancel(&self) -> bool {
        let Some(shared) = self.shared.upgrade() else {
            return false;
        };

        let removed = {
            let mut state = shared.state.lock();
            let removed = state.pending.remove(&self.id);
            if removed.is_some() {
                state.compact_if_sparse();
            }
            removed
        };

        match removed {
            Some(callback) => {
                drop(callback);
                shared.cancelled.fetch_add(1, Ordering::Relaxed);
                trace!(id = self.id, "Watch cancelled");
                true
            }
            None => false,
        }
    }

    /// Whether the watch is still waiting to fire
    pub fn is_pending(&self) -> bool {
        self.shared
            .upgrade()
            .map_or(false, |shared| shared.state.lock().pending.contains_key(&self.id))
    }
}

fn run_driver(shared: Arc<Shared>, dispatch: flume::Sender<Callback>) {
    let mut due: Vec<Callback> = Vec::new();

    loop {
        {
            let mut state = shared.state.lock();
            loop {
                if !state.running {
                    return;
                }

                let now = Instant::now();
                while let Some(top) = state.heap.peek() {
                    let (id, deadline) = (top.id, top.deadline);
                    if !state.pending.contains_key(&id) {
                        state.heap.pop();
                        continue;
                    }
                    if deadline > now {
                        break;
                    }
                    state.heap.pop();
                    if let Some(callback) = state.pending.remove(&id) {
                        due.push(callback);
                    }
                }

                if !due.is_empty() {
                    break;
                }

                match state.heap.peek().map(|entry| entry.deadline) {
                    Some(deadline) => {
                        shared.wakeup.wait_until(&mut state, deadline);
                    }
                    None => shared.wakeup.wait(&mut state),
                }
            }
        }

        shared.fired.fetch_add(due.len() as u64, Ordering::Relaxed);
        for callback in due.drain(..) {
            if dispatch.send(callback).is_err() {
                return;
            }
        }
    }
}

fn run_worker(jobs: flume::Receiver<Callback>) {
    while let Ok(callback) = jobs.recv() {
        if catch_unwind(AssertUnwindSafe(callback)).is_err() {
            warn!("Timer callback panicked; worker continues");
        }
    }
}
