/*!
 * Timer Configuration
 */

use crate::core::limits::{DEFAULT_MAX_PENDING_WATCHES, DEFAULT_TIMER_WORKERS, TIMER_THREAD_PREFIX};
use serde::{Deserialize, Serialize};

/// Timer service configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerConfig {
    /// Threads that run fired callbacks (at least one)
    pub workers: usize,
    /// Live watches accepted before scheduling fails
    pub max_pending: usize,
    /// Prefix for driver and worker thread names
    pub thread_name_prefix: String,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_TIMER_WORKERS,
            max_pending: DEFAULT_MAX_PENDING_WATCHES,
            thread_name_prefix: TIMER_THREAD_PREFIX.to_string(),
        }
    }
}

impl TimerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_max_pending(mut self, max_pending: usize) -> Self {
        self.max_pending = max_pending;
        self
    }

    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Worker count actually used
    #[inline]
    pub fn effective_workers(&self) -> usize {
        self.workers.max(1)
    }
}
