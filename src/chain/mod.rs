/*!
 * Chain Assembly
 *
 * - Policy: tagged policy descriptors
 * - Builder: turns descriptors into a strategy chain
 * - Runtime: owns the timer, worker pool, clock and default sink
 */

mod builder;
mod policy;
mod runtime;

pub use builder::{Chain, ChainBuilder};
pub use policy::PolicySpec;
pub use runtime::{ResilienceRuntime, RuntimeBuilder, RuntimeConfig};
