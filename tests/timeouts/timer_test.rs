/*!
 * Timer Service Tests
 */

use ai_os_resilience::timer::{TimerConfig, TimerService};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[test]
fn test_cancel_fire_race_runs_callback_at_most_once() {
    let timer = TimerService::start(TimerConfig::new().with_workers(2)).unwrap();
    let fired = Arc::new(AtomicUsize::new(0));
    let mut cancelled = 0;

    for _ in 0..200 {
        let counter = fired.clone();
        let task = timer
            .schedule(Duration::from_micros(200), move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        thread::sleep(Duration::from_micros(150));
        if task.cancel() {
            cancelled += 1;
        }
    }

    thread::sleep(Duration::from_millis(100));
    assert_eq!(fired.load(Ordering::SeqCst) + cancelled, 200);
    assert_eq!(timer.pending(), 0);
}

#[test]
fn test_many_watches_share_one_service() {
    let timer = Arc::new(TimerService::with_defaults().unwrap());
    let fired = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let timer = timer.clone();
            let fired = fired.clone();
            thread::spawn(move || {
                for i in 0..250 {
                    let fired = fired.clone();
                    timer
                        .schedule(Duration::from_millis(i % 20), move || {
                            fired.fetch_add(1, Ordering::SeqCst);
                        })
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    thread::sleep(Duration::from_millis(300));
    assert_eq!(fired.load(Ordering::SeqCst), 1000);
    assert_eq!(timer.stats().fired, 1000);
}

#[test]
fn test_shutdown_drops_pending_and_refuses_new() {
    let timer = TimerService::with_defaults().unwrap();
    let fired = Arc::new(AtomicUsize::new(0));

    for _ in 0..10 {
        let fired = fired.clone();
        timer
            .schedule(Duration::from_secs(30), move || {
                fired.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
    }
    assert_eq!(timer.pending(), 10);

    timer.shutdown();
    timer.shutdown();

    assert_eq!(timer.pending(), 0);
    assert_eq!(fired.load(Ordering::SeqCst), 0);
    assert!(timer
        .schedule(Duration::from_millis(1), || {})
        .unwrap_err()
        .is_scheduling_failure());
}
