/*!
 * Rate Limit Property Tests
 */

use ai_os_resilience::execution::Execution;
use ai_os_resilience::rate_limit::{RateLimit, RateLimitConfig, RateLimiter};
use ai_os_resilience::{InvocationContext, ManualClock, Strategy};
use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;

/// Drive a limiter through `gaps` (milliseconds between attempts) and
/// return the instants, in ms since start, at which calls were admitted
fn admitted_offsets(capacity: usize, window_ms: u64, spacing_ms: u64, gaps: &[u64]) -> Vec<u64> {
    let clock = ManualClock::new();
    let config = RateLimitConfig::new(capacity, Duration::from_millis(window_ms))
        .with_min_spacing(Duration::from_millis(spacing_ms));
    let limiter = RateLimiter::new(&config, Arc::new(clock.clone())).unwrap();
    let limit = RateLimit::new(limiter, Execution::new());
    let ctx = InvocationContext::new(|| Ok(()));

    let mut elapsed = 0;
    let mut admitted = Vec::new();
    for gap in gaps {
        clock.advance_millis(*gap);
        elapsed += gap;
        if limit.apply(&ctx).is_ok() {
            admitted.push(elapsed);
        }
    }
    admitted
}

proptest! {
    #[test]
    fn never_more_than_capacity_per_window(
        capacity in 1usize..8,
        window_ms in 10u64..200,
        gaps in prop::collection::vec(0u64..40, 1..200),
    ) {
        let admitted = admitted_offsets(capacity, window_ms, 0, &gaps);

        for (i, &at) in admitted.iter().enumerate() {
            let in_window = admitted[..=i].iter().filter(|&&t| at - t < window_ms).count();
            prop_assert!(in_window <= capacity);
        }
    }

    #[test]
    fn spaced_admissions_never_too_close(
        spacing_ms in 1u64..50,
        gaps in prop::collection::vec(0u64..30, 1..200),
    ) {
        let admitted = admitted_offsets(1000, 10_000, spacing_ms, &gaps);
        prop_assert!(admitted.windows(2).all(|pair| pair[1] - pair[0] >= spacing_ms));
    }

    #[test]
    fn idle_window_admits_first_call(
        capacity in 1usize..8,
        window_ms in 10u64..200,
        gaps in prop::collection::vec(0u64..40, 0..100),
    ) {
        let mut gaps = gaps;
        gaps.push(window_ms);
        let admitted = admitted_offsets(capacity, window_ms, 0, &gaps);
        let last = gaps.iter().sum::<u64>();
        prop_assert_eq!(admitted.last().copied(), Some(last));
    }
}
