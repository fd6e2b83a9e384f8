/*!
 * Event Stream Tests
 */

use ai_os_resilience::monitoring::{
    Category, Decision, EventCounter, EventStream, FanoutSink, Payload, Phase,
};
use ai_os_resilience::{RateLimitConfig, ResilienceRuntime, TimeoutConfig};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

#[test]
fn test_subscriber_sees_chain_events_in_order() {
    let stream = EventStream::new();
    let mut subscriber = stream.subscribe();
    let runtime = ResilienceRuntime::builder()
        .event_sink(Arc::new(stream.clone()))
        .build()
        .unwrap();
    let chain = runtime
        .chain::<u8>()
        .rate_limit(RateLimitConfig::new(1, Duration::from_secs(10)).with_description("gate"))
        .timeout(TimeoutConfig::from_millis(500).with_description("deadline"))
        .build()
        .unwrap();

    chain.call(|| Ok(1)).unwrap().wait().unwrap();

    let events: Vec<(Category, Payload)> = subscriber
        .drain()
        .into_iter()
        .map(|event| (event.category, event.payload))
        .collect();
    assert_eq!(
        events,
        vec![
            (Category::RateLimit, Payload::Trace(Phase::Started)),
            (Category::RateLimit, Payload::DecisionMade(Decision::Permitted)),
            (Category::Timeout, Payload::Trace(Phase::Started)),
            (Category::Execution, Payload::Trace(Phase::Started)),
            (Category::Execution, Payload::Trace(Phase::Finished)),
            (Category::Timeout, Payload::Trace(Phase::Finished)),
            (Category::RateLimit, Payload::Trace(Phase::Finished)),
        ]
    );

    runtime.shutdown();
}

#[test]
fn test_fanout_to_stream_and_counter() {
    let stream = EventStream::with_capacity(4);
    let counter = EventCounter::new();
    let fanout = FanoutSink::new()
        .with(Arc::new(stream.clone()))
        .with(Arc::new(counter.clone()));
    let runtime = ResilienceRuntime::builder()
        .event_sink(Arc::new(fanout))
        .build()
        .unwrap();
    let chain = runtime
        .chain::<u8>()
        .rate_limit(RateLimitConfig::new(2, Duration::from_secs(10)).with_description("burst"))
        .build()
        .unwrap();

    for _ in 0..5 {
        let _ = chain.call(|| Ok(0)).unwrap().wait();
    }

    // The ring overflowed and dropped silently; the counter saw everything
    let stats = stream.stats();
    assert_eq!(stats.events_produced, 4);
    assert!(stats.events_dropped > 0);
    assert_eq!(counter.snapshot("burst").permitted, 2);
    assert_eq!(counter.snapshot("burst").rejected, 3);

    runtime.shutdown();
}
