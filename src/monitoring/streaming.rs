/*!
 * Event Stream Sink
 *
 * Buffers strategy events in a fixed-capacity queue so an observer can read
 * them after the fact. Strategies publish from whatever thread runs the
 * call and never block on the observer: once the buffer is full, further
 * events are counted as dropped and discarded.
 */

use super::events::Event;
use super::sink::EventSink;
use crate::core::limits::EVENT_RING_SIZE;
use crossbeam_queue::ArrayQueue;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

/// Counters describing what went through an [`EventStream`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamStats {
    pub events_produced: u64,
    pub events_consumed: u64,
    pub events_dropped: u64,
    pub active_subscribers: usize,
}

struct Shared {
    buffer: ArrayQueue<Event>,
    produced: AtomicU64,
    consumed: AtomicU64,
    dropped: AtomicU64,
    subscribers: AtomicUsize,
}

/// Event sink that keeps the most recent events for later inspection
///
/// Clones share one buffer, so the handle given to the runtime and the one
/// kept by the observer see the same events.
#[derive(Clone)]
pub struct EventStream {
    shared: Arc<Shared>,
}

impl EventStream {
    pub fn new() -> Self {
        Self::with_capacity(EVENT_RING_SIZE)
    }

    /// Buffer at most `capacity` unread events (at least one)
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            shared: Arc::new(Shared {
                buffer: ArrayQueue::new(capacity.max(1)),
                produced: AtomicU64::new(0),
                consumed: AtomicU64::new(0),
                dropped: AtomicU64::new(0),
                subscribers: AtomicUsize::new(0),
            }),
        }
    }

    /// Buffer `event`; `false` means the buffer was full and it was dropped
    #[inline]
    pub fn publish(&self, event: Event) -> bool {
        let accepted = self.shared.buffer.push(event).is_ok();
        let counter = if accepted {
            &self.shared.produced
        } else {
            &self.shared.dropped
        };
        counter.fetch_add(1, Ordering::Relaxed);
        accepted
    }

    /// Oldest unread event, if any
    #[inline]
    pub fn try_consume(&self) -> Option<Event> {
        let event = self.shared.buffer.pop()?;
        self.shared.consumed.fetch_add(1, Ordering::Relaxed);
        Some(event)
    }

    /// Reader handle; readers share the buffer, each event is read once
    pub fn subscribe(&self) -> Subscriber {
        self.shared.subscribers.fetch_add(1, Ordering::Relaxed);
        Subscriber {
            stream: self.clone(),
            read: 0,
        }
    }

    pub fn stats(&self) -> StreamStats {
        StreamStats {
            events_produced: self.shared.produced.load(Ordering::Relaxed),
            events_consumed: self.shared.consumed.load(Ordering::Relaxed),
            events_dropped: self.shared.dropped.load(Ordering::Relaxed),
            active_subscribers: self.shared.subscribers.load(Ordering::Relaxed),
        }
    }

    /// Fraction of the buffer holding unread events
    #[inline]
    pub fn utilization(&self) -> f64 {
        self.shared.buffer.len() as f64 / self.shared.buffer.capacity() as f64
    }
}

impl Default for EventStream {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for EventStream {
    fn on_event(&self, event: &Event) -> anyhow::Result<()> {
        // Overflow is recorded in the stats, the caller is not told
        self.publish(event.clone());
        Ok(())
    }
}

/// Reads events out of an [`EventStream`]
pub struct Subscriber {
    stream: EventStream,
    read: u64,
}

impl Subscriber {
    #[inline]
    pub fn next(&mut self) -> Option<Event> {
        let event = self.stream.try_consume()?;
        self.read += 1;
        Some(event)
    }

    /// Everything unread right now, oldest first
    pub fn drain(&mut self) -> Vec<Event> {
        std::iter::from_fn(|| self.next()).collect()
    }

    /// Events read through this handle
    pub fn consumed(&self) -> u64 {
        self.read
    }
}

impl Drop for Subscriber {
    fn drop(&mut self) {
        self.stream
            .shared
            .subscribers
            .fetch_sub(1, Ordering::Relaxed);
    }
}
