/*!
 * Timeout
 *
 * Asynchronous timeout with cooperative cancellation on the shared timer
 */

mod config;
mod strategy;

pub use config::TimeoutConfig;
pub use strategy::Timeout;
