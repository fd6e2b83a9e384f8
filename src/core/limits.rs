/*!
 * Resilience Limits and Constants
 *
 * Centralized location for defaults shared across policies.
 * Performance-critical constants are marked with [PERF].
 */

use std::time::Duration;

// =============================================================================
// TIMER SERVICE
// =============================================================================

/// Callback workers for the shared timer service
/// [PERF] Callbacks only resolve promises, so a couple of threads suffice
pub const DEFAULT_TIMER_WORKERS: usize = 2;

/// Upper bound on live watches before scheduling fails
pub const DEFAULT_MAX_PENDING_WATCHES: usize = 1_000_000;

/// Heap compaction trigger: rebuild once tombstones exceed live watches
/// and the heap holds at least this many entries
/// [PERF] Avoids rebuilding tiny heaps on every cancellation
pub const TIMER_COMPACTION_MIN_HEAP: usize = 64;

/// Thread name prefix for timer threads
pub const TIMER_THREAD_PREFIX: &str = "resilience-timer";

// =============================================================================
// WORKER POOL
// =============================================================================

/// Default worker threads for offloaded execution
pub const DEFAULT_POOL_THREADS: usize = 4;

/// Bounded submission queue for the worker pool
pub const DEFAULT_POOL_QUEUE: usize = 1024;

/// Thread name prefix for pool workers
pub const POOL_THREAD_PREFIX: &str = "resilience-worker";

// =============================================================================
// RATE LIMITING
// =============================================================================

/// Default window for rate limiting (1s)
pub const DEFAULT_RATE_WINDOW: Duration = Duration::from_secs(1);

/// Default admissions per window
pub const DEFAULT_RATE_CAPACITY: usize = 100;

// =============================================================================
// TIMEOUT
// =============================================================================

/// Default timeout duration (1s)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

// =============================================================================
// OBSERVABILITY
// =============================================================================

/// Maximum events buffered by the event stream (power of 2)
/// [PERF] Bounded ring: producers drop instead of blocking when full
pub const EVENT_RING_SIZE: usize = 4096;
