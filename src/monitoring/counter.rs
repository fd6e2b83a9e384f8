/*!
 * Event Counter
 *
 * Aggregating sink: counts decisions per policy description. Suitable as
 * the subscriber a metrics layer polls.
 */

use super::events::{Decision, Event, Payload};
use super::sink::EventSink;
use ahash::RandomState;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Default)]
struct DecisionCounts {
    permitted: AtomicU64,
    rejected: AtomicU64,
}

/// Snapshot of counts for one policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecisionSnapshot {
    pub permitted: u64,
    pub rejected: u64,
}

/// Concurrent per-policy decision counter
#[derive(Clone)]
pub struct EventCounter {
    counts: Arc<DashMap<Arc<str>, DecisionCounts, RandomState>>,
    trace_markers: Arc<AtomicU64>,
}

impl EventCounter {
    pub fn new() -> Self {
        Self {
            counts: Arc::new(DashMap::with_hasher(RandomState::new())),
            trace_markers: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Counts recorded for the policy with this description
    pub fn snapshot(&self, description: &str) -> DecisionSnapshot {
        self.counts
            .get(description)
            .map(|counts| DecisionSnapshot {
                permitted: counts.permitted.load(Ordering::Relaxed),
                rejected: counts.rejected.load(Ordering::Relaxed),
            })
            .unwrap_or_default()
    }

    pub fn count(&self, description: &str, decision: Decision) -> u64 {
        let snapshot = self.snapshot(description);
        match decision {
            Decision::Permitted => snapshot.permitted,
            Decision::Rejected => snapshot.rejected,
        }
    }

    /// Entry/exit markers seen across all policies
    pub fn trace_markers(&self) -> u64 {
        self.trace_markers.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.counts.clear();
        self.trace_markers.store(0, Ordering::Relaxed);
    }
}

impl Default for EventCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for EventCounter {
    fn on_event(&self, event: &Event) -> anyhow::Result<()> {
        match event.payload {
            Payload::DecisionMade(decision) => {
                let counts = self
                    .counts
                    .entry(Arc::clone(&event.description))
                    .or_default();
                let slot = match decision {
                    Decision::Permitted => &counts.permitted,
                    Decision::Rejected => &counts.rejected,
                };
                slot.fetch_add(1, Ordering::Relaxed);
            }
            Payload::Trace(_) => {
                self.trace_markers.fetch_add(1, Ordering::Relaxed);
            }
        }
        Ok(())
    }
}
