/*!
 * Chain Composition Tests
 */

use ai_os_resilience::monitoring::EventCounter;
use ai_os_resilience::{
    ManualClock, PolicySpec, RateLimitConfig, ResilienceRuntime, TimeoutConfig,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[test]
fn test_rate_limit_in_front_of_timeout() {
    let clock = ManualClock::new();
    let counter = EventCounter::new();
    let runtime = ResilienceRuntime::builder()
        .clock(Arc::new(clock.clone()))
        .event_sink(Arc::new(counter.clone()))
        .build()
        .unwrap();

    let chain = runtime
        .chain::<u32>()
        .rate_limit(RateLimitConfig::new(1, Duration::from_secs(1)).with_description("quota"))
        .timeout(TimeoutConfig::from_millis(500).with_description("deadline"))
        .build()
        .unwrap();

    assert_eq!(chain.call(|| Ok(1)).unwrap().wait().unwrap(), 1);

    // Rejected synchronously: resolved before call returns, nothing armed
    let rejected = chain.call(|| Ok(2)).unwrap();
    assert!(rejected.is_done());
    assert!(rejected.wait().unwrap_err().is_rejection());
    assert_eq!(runtime.timer().stats().scheduled, 1);

    clock.advance(Duration::from_secs(1));
    assert_eq!(chain.call(|| Ok(3)).unwrap().wait().unwrap(), 3);

    let snapshot = counter.snapshot("quota");
    assert_eq!((snapshot.permitted, snapshot.rejected), (2, 1));

    runtime.shutdown();
}

#[test]
fn test_timeout_outside_rate_limit() {
    let runtime = ResilienceRuntime::start().unwrap();
    let chain = runtime
        .chain::<&'static str>()
        .timeout(TimeoutConfig::from_millis(100))
        .rate_limit(RateLimitConfig::new(10, Duration::from_secs(1)))
        .build()
        .unwrap();

    let slow = chain
        .call(|| {
            thread::sleep(Duration::from_millis(400));
            Ok("slow")
        })
        .unwrap();
    assert!(slow.wait().unwrap_err().is_timeout());

    let fast = chain.call(|| Ok("fast")).unwrap();
    assert_eq!(fast.wait().unwrap(), "fast");

    runtime.shutdown();
}

#[test]
fn test_policies_reported_outermost_first() {
    let runtime = ResilienceRuntime::start().unwrap();
    let chain = runtime
        .chain::<()>()
        .policy(TimeoutConfig::from_millis(100).with_description("outer"))
        .policy(RateLimitConfig::default().with_description("middle"))
        .policy(TimeoutConfig::from_millis(50).with_description("inner"))
        .build()
        .unwrap();

    let shape: Vec<(&str, &str)> = chain
        .policies()
        .iter()
        .map(|policy| (policy.kind(), policy.description()))
        .collect();
    assert_eq!(
        shape,
        vec![("timeout", "outer"), ("rate_limit", "middle"), ("timeout", "inner")]
    );
    assert!(matches!(chain.policies()[1], PolicySpec::RateLimit(_)));

    runtime.shutdown();
}

#[test]
fn test_trace_markers_bracket_each_layer() {
    let counter = EventCounter::new();
    let runtime = ResilienceRuntime::builder()
        .event_sink(Arc::new(counter.clone()))
        .build()
        .unwrap();
    let chain = runtime
        .chain::<u8>()
        .rate_limit(RateLimitConfig::default())
        .timeout(TimeoutConfig::default())
        .build()
        .unwrap();

    chain.call(|| Ok(0)).unwrap().wait().unwrap();

    // Started + finished for the limiter, the timeout and the execution leaf
    assert_eq!(counter.trace_markers(), 6);

    runtime.shutdown();
}
