/*!
 * Admission Tests
 * Window, spacing and concurrency behavior of the synchronous limiter
 */

use ai_os_resilience::execution::Execution;
use ai_os_resilience::rate_limit::{RateLimit, RateLimitConfig, RateLimiter, WindowKind};
use ai_os_resilience::{InvocationContext, ManualClock, Strategy};
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn strategy(config: RateLimitConfig, clock: &ManualClock) -> RateLimit<Execution> {
    let limiter = RateLimiter::new(&config, Arc::new(clock.clone())).unwrap();
    RateLimit::new(limiter, Execution::new())
}

#[test]
fn test_single_slot_per_second() {
    let clock = ManualClock::new();
    let limit = strategy(RateLimitConfig::new(1, Duration::from_millis(1000)), &clock);
    let ctx = InvocationContext::new(|| Ok(()));

    assert!(limit.apply(&ctx).is_ok());

    clock.advance_millis(10);
    assert!(limit.apply(&ctx).unwrap_err().is_rejection());

    clock.advance_millis(991);
    assert!(limit.apply(&ctx).is_ok());
}

#[test]
fn test_burst_then_slot_frees_after_window() {
    let clock = ManualClock::new();
    let limit = strategy(RateLimitConfig::new(5, Duration::from_millis(200)), &clock);
    let ctx = InvocationContext::new(|| Ok(()));

    let admitted = (0..6).filter(|_| limit.apply(&ctx).is_ok()).count();
    assert_eq!(admitted, 5);

    clock.advance_millis(199);
    assert!(limit.apply(&ctx).is_err());

    clock.advance_millis(1);
    assert_eq!((0..6).filter(|_| limit.apply(&ctx).is_ok()).count(), 5);
}

#[test]
fn test_spacing_rejects_close_calls() {
    let clock = ManualClock::new();
    let config = RateLimitConfig::new(100, Duration::from_secs(1))
        .with_min_spacing(Duration::from_millis(100));
    let limit = strategy(config, &clock);
    let ctx = InvocationContext::new(|| Ok(()));

    let mut admitted_at = Vec::new();
    for step in 0..40u64 {
        if limit.apply(&ctx).is_ok() {
            admitted_at.push(step * 30);
        }
        clock.advance_millis(30);
    }

    assert_eq!(admitted_at[..4], [0, 120, 240, 360]);
    assert!(admitted_at.windows(2).all(|pair| pair[1] - pair[0] >= 100));
}

#[test]
fn test_spaced_preset() {
    let clock = ManualClock::new();
    let limit = strategy(RateLimitConfig::spaced(Duration::from_millis(50)), &clock);
    let ctx = InvocationContext::new(|| Ok(()));

    assert!(limit.apply(&ctx).is_ok());
    clock.advance_millis(49);
    assert!(limit.apply(&ctx).is_err());
    clock.advance_millis(1);
    assert!(limit.apply(&ctx).is_ok());
}

#[test]
fn test_fixed_window_kind() {
    let clock = ManualClock::new();
    let config = RateLimitConfig::new(3, Duration::from_millis(100)).with_kind(WindowKind::Fixed);
    let limit = strategy(config, &clock);
    let ctx = InvocationContext::new(|| Ok(()));

    clock.advance_millis(50);
    assert_eq!((0..5).filter(|_| limit.apply(&ctx).is_ok()).count(), 3);

    // Window opened at the first admission, so it closes 100ms later
    clock.advance_millis(99);
    assert!(limit.apply(&ctx).is_err());
    clock.advance_millis(1);
    assert_eq!((0..5).filter(|_| limit.apply(&ctx).is_ok()).count(), 3);
}

#[test]
fn test_concurrent_callers_never_exceed_capacity() {
    let clock = ManualClock::new();
    let limit = Arc::new(strategy(RateLimitConfig::new(25, Duration::from_secs(60)), &clock));
    let runs = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let limit = limit.clone();
            let runs = runs.clone();
            thread::spawn(move || {
                let counted = runs.clone();
                let ctx = InvocationContext::new(move || {
                    counted.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                });
                (0..100).filter(|_| limit.apply(&ctx).is_ok()).count()
            })
        })
        .collect();

    let admitted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
    assert_eq!(admitted, 25);
    assert_eq!(runs.load(Ordering::SeqCst), 25);
    assert_eq!(limit.limiter().admitted(), 25);
}

#[test]
fn test_zero_capacity_rejects_everything() {
    let clock = ManualClock::new();
    let limit = strategy(RateLimitConfig::new(0, Duration::from_secs(1)), &clock);
    let ctx = InvocationContext::new(|| Ok(()));

    for _ in 0..10 {
        assert!(limit.apply(&ctx).unwrap_err().is_rejection());
        clock.advance_millis(500);
    }
}
