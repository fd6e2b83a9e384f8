/*!
 * Timer
 *
 * Shared deferred-callback scheduler used by timeout strategies:
 * - Config: worker count, capacity, thread naming
 * - Service: deadline heap, driver thread, callback workers
 */

mod config;
mod entry;
mod service;

pub use config::TimerConfig;
pub use service::{TimerService, TimerStats, TimerTask};
