/*!
 * Core Module
 * Strategy contract, invocation context, clock and error handling
 */

pub mod clock;
pub mod context;
pub mod errors;
pub mod limits;
pub mod strategy;

// Re-export for convenience
pub use clock::{Clock, ManualClock, SystemClock};
pub use context::{Interrupt, InterruptBinding, InvocationContext, Work};
pub use errors::{ResilienceError, ResilienceResult};
pub use strategy::{BoxStrategy, FnStrategy, Strategy};
