/*!
 * Monitoring
 *
 * Resilience events and the sinks that receive them:
 * - Events: decision and trace-marker payloads
 * - Sink: the fire-and-forget contract strategies fire into
 * - Streaming: bounded lock-free ring for subscribers
 * - Counter: per-policy decision aggregation
 * - Tracer: tracing subscriber setup
 */

pub mod counter;
pub mod events;
pub mod sink;
pub mod streaming;
pub mod tracer;

pub use counter::{DecisionSnapshot, EventCounter};
pub use events::{Category, Decision, Event, Payload, Phase};
pub use sink::{EventSink, FanoutSink, FnSink, NoopSink, TracingSink};
pub use streaming::{EventStream, StreamStats, Subscriber};
pub use tracer::init_tracing;
