/*!
 * Execution
 *
 * Innermost strategies that actually run the unit of work:
 * - Direct: on the calling thread, synchronous chains
 * - Offloaded: on a worker pool, asynchronous chains
 * - Pool: the executors offloaded work is submitted to
 */

mod direct;
mod offloaded;
pub mod pool;

pub use direct::Execution;
pub use offloaded::OffloadedExecution;
pub use pool::{Job, ThreadPool, TokioBlockingPool, WorkerPool};
