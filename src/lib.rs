/*!
 * AI-OS Resilience Library
 * Composable resilience policies (rate limiting, timeout) around units of work
 */

pub mod chain;
pub mod core;
pub mod execution;
pub mod monitoring;
pub mod promise;
pub mod rate_limit;
pub mod timeout;
pub mod timer;

// Re-exports
pub use chain::{Chain, ChainBuilder, PolicySpec, ResilienceRuntime, RuntimeBuilder, RuntimeConfig};
pub use crate::core::{
    Clock, Interrupt, InvocationContext, ManualClock, ResilienceError, ResilienceResult, Strategy,
    SystemClock,
};
pub use execution::{Execution, OffloadedExecution, ThreadPool, TokioBlockingPool, WorkerPool};
pub use monitoring::{init_tracing, Decision, Event, EventSink};
pub use promise::AsyncResult;
pub use rate_limit::{AsyncRateLimit, RateLimit, RateLimitConfig, RateLimiter, WindowKind};
pub use timeout::{Timeout, TimeoutConfig};
pub use timer::{TimerConfig, TimerService};
