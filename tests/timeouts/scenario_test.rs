/*!
 * Timeout Scenario Tests
 *
 * Real timer, real worker pool. Timing assertions leave generous slack and
 * the tests run serially so they do not compete for the pool.
 */

use ai_os_resilience::{
    AsyncResult, Interrupt, InvocationContext, ResilienceRuntime, TimeoutConfig, TokioBlockingPool,
};
use serial_test::serial;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const SLACK: Duration = Duration::from_millis(250);

#[derive(Debug, thiserror::Error)]
#[error("inventory service unavailable")]
struct InventoryError;

fn runtime() -> ResilienceRuntime {
    ResilienceRuntime::builder().worker_threads(4).build().unwrap()
}

#[test]
#[serial]
fn test_fast_delegate_wins() {
    let runtime = runtime();
    let chain = runtime
        .chain::<String>()
        .timeout(TimeoutConfig::from_millis(1000))
        .build()
        .unwrap();

    let start = Instant::now();
    let result = chain
        .call(|| {
            thread::sleep(Duration::from_millis(300));
            Ok("foobar".to_string())
        })
        .unwrap();

    assert_eq!(result.wait().unwrap(), "foobar");
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(300));
    assert!(elapsed < Duration::from_millis(300) + SLACK);
    assert_eq!(runtime.timer().pending(), 0);

    runtime.shutdown();
}

#[test]
#[serial]
fn test_slow_delegate_times_out() {
    let runtime = runtime();
    let chain = runtime
        .chain::<String>()
        .timeout(TimeoutConfig::from_millis(300).with_description("slow-backend"))
        .build()
        .unwrap();

    let start = Instant::now();
    let result = chain
        .call(|| {
            thread::sleep(Duration::from_millis(1000));
            Ok("too late".to_string())
        })
        .unwrap();

    let err = result.wait().unwrap_err();
    let elapsed = start.elapsed();
    assert!(err.is_timeout());
    assert_eq!(err.policy_description(), Some("slow-backend"));
    assert!(elapsed >= Duration::from_millis(300));
    assert!(elapsed < Duration::from_millis(300) + SLACK);

    // The late completion is discarded
    thread::sleep(Duration::from_millis(900));
    assert!(result.try_get().unwrap().unwrap_err().is_timeout());

    runtime.shutdown();
}

#[test]
#[serial]
fn test_failing_delegate_error_adopted() {
    let runtime = runtime();
    let chain = runtime
        .chain::<u32>()
        .timeout(TimeoutConfig::from_millis(1000))
        .build()
        .unwrap();

    let start = Instant::now();
    let result = chain
        .call(|| {
            thread::sleep(Duration::from_millis(300));
            Err(InventoryError.into())
        })
        .unwrap();

    let err = result.wait().unwrap_err();
    assert!(err.is_delegate_failure());
    assert!(err.downcast_ref::<InventoryError>().is_some());
    assert!(start.elapsed() < Duration::from_millis(300) + SLACK);

    runtime.shutdown();
}

#[test]
#[serial]
fn test_timeout_interrupts_cooperative_work() {
    let runtime = runtime();
    let chain = runtime
        .chain::<&'static str>()
        .timeout(TimeoutConfig::from_millis(100))
        .build()
        .unwrap();

    let interrupt = Interrupt::new();
    let (observed_tx, observed_rx) = flume::bounded(1);
    let work_interrupt = interrupt.clone();
    let ctx = InvocationContext::blocking(move || {
        let interrupted = work_interrupt.sleep(Duration::from_secs(5));
        let _ = observed_tx.send(interrupted);
        Ok("finished")
    })
    .with_interrupt(interrupt);

    let result = chain.apply(&ctx).unwrap();
    assert!(result.wait().unwrap_err().is_timeout());

    let interrupted = observed_rx.recv_timeout(Duration::from_secs(1)).unwrap();
    assert!(interrupted);

    runtime.shutdown();
}

#[test]
#[serial]
fn test_async_delegate_handle_forwarded() {
    let runtime = runtime();
    let chain = runtime
        .chain::<u64>()
        .timeout(TimeoutConfig::from_millis(500))
        .build()
        .unwrap();

    let inner = AsyncResult::pending();
    let producer = inner.clone();
    let ctx = InvocationContext::new(move || Ok(inner.clone()));

    let result = chain.apply(&ctx).unwrap();
    thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        producer.complete(64);
    });

    assert_eq!(result.wait().unwrap(), 64);
    runtime.shutdown();
}

#[test]
#[serial]
fn test_unbounded_timeout_returns_value() {
    let runtime = runtime();
    let chain = runtime
        .chain::<u32>()
        .timeout(TimeoutConfig::new(Duration::MAX))
        .build()
        .unwrap();

    let result = chain
        .call(|| {
            thread::sleep(Duration::from_millis(20));
            Ok(7)
        })
        .unwrap();

    assert_eq!(result.wait_timeout(Duration::from_secs(2)).unwrap().unwrap(), 7);
    assert_eq!(runtime.timer().pending(), 0);

    runtime.shutdown();
}

#[test]
#[serial]
fn test_shutdown_leaves_in_flight_call_to_delegate() {
    let runtime = runtime();
    let chain = runtime
        .chain::<&'static str>()
        .timeout(TimeoutConfig::from_millis(1000))
        .build()
        .unwrap();

    let result = chain
        .call(|| {
            thread::sleep(Duration::from_millis(100));
            Ok("drained")
        })
        .unwrap();

    // The watch is dropped, the built-in pool finishes the queued work
    runtime.shutdown();
    assert_eq!(result.wait_timeout(Duration::from_secs(2)).unwrap().unwrap(), "drained");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[serial]
async fn test_awaitable_on_tokio_pool() {
    let pool = Arc::new(TokioBlockingPool::current().unwrap());
    let runtime = ResilienceRuntime::builder().pool(pool).build().unwrap();
    let chain = runtime
        .chain::<&'static str>()
        .timeout(TimeoutConfig::from_millis(200))
        .build()
        .unwrap();

    let fast = chain.call(|| Ok("fast")).unwrap();
    assert_eq!(fast.await.unwrap(), "fast");

    let slow = chain
        .call(|| {
            thread::sleep(Duration::from_millis(600));
            Ok("slow")
        })
        .unwrap();
    assert!(slow.await.unwrap_err().is_timeout());

    runtime.shutdown();
}
