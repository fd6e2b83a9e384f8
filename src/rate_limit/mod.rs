/*!
 * Rate Limiting
 *
 * Admission control in front of a delegate:
 * - Config: capacity, window, minimum spacing, window kind
 * - Window: eviction and admission bookkeeping
 * - Strategy: synchronous and asynchronous limiter strategies
 */

mod config;
mod strategy;
mod window;

pub use config::{RateLimitConfig, WindowKind};
pub use strategy::{AsyncRateLimit, RateLimit, RateLimiter};
pub use window::TimeWindow;
