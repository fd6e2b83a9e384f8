/*!
 * Resilience Runtime
 *
 * Lifecycle owner for everything chains share: the timer service, the
 * worker pool offloaded work runs on, the clock rate limiters read and the
 * default event sink. Cheap to clone; every clone refers to the same
 * services.
 */

use super::builder::ChainBuilder;
use crate::core::limits::{DEFAULT_POOL_QUEUE, DEFAULT_POOL_THREADS};
use crate::core::{Clock, ResilienceResult, SystemClock};
use crate::execution::{ThreadPool, WorkerPool};
use crate::monitoring::{EventSink, NoopSink};
use crate::timer::{TimerConfig, TimerService};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Serializable part of the runtime setup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub timer: TimerConfig,
    /// Threads of the built-in worker pool
    pub pool_threads: usize,
    /// Jobs queued before offloading is refused
    pub pool_queue: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            timer: TimerConfig::default(),
            pool_threads: DEFAULT_POOL_THREADS,
            pool_queue: DEFAULT_POOL_QUEUE,
        }
    }
}

struct RuntimeInner {
    timer: Arc<TimerService>,
    pool: Arc<dyn WorkerPool>,
    owned_pool: Option<Arc<ThreadPool>>,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn EventSink>,
}

/// Shared services for assembled chains
#[derive(Clone)]
pub struct ResilienceRuntime {
    inner: Arc<RuntimeInner>,
}

impl ResilienceRuntime {
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::default()
    }

    /// Start a runtime with default settings
    pub fn start() -> ResilienceResult<Self> {
        Self::builder().build()
    }

    /// Begin assembling a chain whose work yields `T`
    pub fn chain<T>(&self) -> ChainBuilder<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        ChainBuilder::new(self.clone())
    }

    pub fn timer(&self) -> &Arc<TimerService> {
        &self.inner.timer
    }

    pub fn pool(&self) -> &Arc<dyn WorkerPool> {
        &self.inner.pool
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.inner.clock
    }

    pub fn sink(&self) -> &Arc<dyn EventSink> {
        &self.inner.sink
    }

    /// Stop the timer and the built-in pool
    ///
    /// Pending watches are dropped without firing, so a call still in flight
    /// can no longer time out: it resolves only when its delegate does. The
    /// built-in pool finishes queued work before this returns. A pool
    /// supplied by the host is left to the host, and a job that pool drops
    /// resolves its call with a scheduling failure. Idempotent.
    pub fn shutdown(&self) {
        self.inner.timer.shutdown();
        if let Some(pool) = &self.inner.owned_pool {
            pool.shutdown();
        }
        info!("Resilience runtime stopped");
    }
}

impl std::fmt::Debug for ResilienceRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResilienceRuntime")
            .field("timer", &self.inner.timer)
            .field("owns_pool", &self.inner.owned_pool.is_some())
            .finish_non_exhaustive()
    }
}

/// Builder for [`ResilienceRuntime`]
#[derive(Default)]
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    pool: Option<Arc<dyn WorkerPool>>,
    clock: Option<Arc<dyn Clock>>,
    sink: Option<Arc<dyn EventSink>>,
}

impl RuntimeBuilder {
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn timer_config(mut self, timer: TimerConfig) -> Self {
        self.config.timer = timer;
        self
    }

    pub fn worker_threads(mut self, threads: usize) -> Self {
        self.config.pool_threads = threads;
        self
    }

    /// Run offloaded work on a host-supplied pool instead of a built-in one
    pub fn pool(mut self, pool: Arc<dyn WorkerPool>) -> Self {
        self.pool = Some(pool);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Sink used by contexts a chain creates itself
    pub fn event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn build(self) -> ResilienceResult<ResilienceRuntime> {
        let timer = Arc::new(TimerService::start(self.config.timer.clone())?);

        let (pool, owned_pool) = match self.pool {
            Some(pool) => (pool, None),
            None => {
                let owned = Arc::new(ThreadPool::new(
                    self.config.pool_threads,
                    self.config.pool_queue,
                )?);
                (owned.clone() as Arc<dyn WorkerPool>, Some(owned))
            }
        };

        info!(
            timer_workers = self.config.timer.effective_workers(),
            host_pool = owned_pool.is_none(),
            "Resilience runtime started"
        );

        Ok(ResilienceRuntime {
            inner: Arc::new(RuntimeInner {
                timer,
                pool,
                owned_pool,
                clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
                sink: self.sink.unwrap_or_else(|| Arc::new(NoopSink)),
            }),
        })
    }
}
