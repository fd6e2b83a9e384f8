/*!
 * Event System
 * Strongly-typed resilience events fired toward the event sink
 */

use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};
use std::time::Instant;

/// Policy family that fired the event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Category {
    RateLimit,
    Timeout,
    Execution,
}

/// Admission decision of a rate limiter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Decision {
    Permitted,
    Rejected,
}

/// Trace marker bracketing a strategy's `apply`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Started,
    Finished,
}

/// Event payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Payload {
    DecisionMade(Decision),
    Trace(Phase),
}

/// Unified event type - everything a strategy reports flows through this
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Monotonic timestamp (nanoseconds since first event in the process)
    pub timestamp_ns: u64,
    pub category: Category,
    /// Description of the policy instance
    pub description: Arc<str>,
    pub payload: Payload,
}

fn monotonic_ns() -> u64 {
    static EPOCH: OnceLock<Instant> = OnceLock::new();
    EPOCH.get_or_init(Instant::now).elapsed().as_nanos() as u64
}

impl Event {
    pub fn new(category: Category, description: impl Into<Arc<str>>, payload: Payload) -> Self {
        Self {
            timestamp_ns: monotonic_ns(),
            category,
            description: description.into(),
            payload,
        }
    }

    /// Rate limiter decision
    #[inline]
    pub fn decision(description: impl Into<Arc<str>>, decision: Decision) -> Self {
        Self::new(Category::RateLimit, description, Payload::DecisionMade(decision))
    }

    /// Entry marker for `apply`
    #[inline]
    pub fn started(category: Category, description: impl Into<Arc<str>>) -> Self {
        Self::new(category, description, Payload::Trace(Phase::Started))
    }

    /// Exit marker for `apply`
    #[inline]
    pub fn finished(category: Category, description: impl Into<Arc<str>>) -> Self {
        Self::new(category, description, Payload::Trace(Phase::Finished))
    }

    /// Decision carried by this event, if it is a decision event
    pub fn as_decision(&self) -> Option<Decision> {
        match self.payload {
            Payload::DecisionMade(decision) => Some(decision),
            Payload::Trace(_) => None,
        }
    }

    pub fn is_trace(&self) -> bool {
        matches!(self.payload, Payload::Trace(_))
    }
}
