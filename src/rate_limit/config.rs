/*!
 * Rate Limit Configuration
 */

use crate::core::errors::{ResilienceError, ResilienceResult};
use crate::core::limits::{DEFAULT_RATE_CAPACITY, DEFAULT_RATE_WINDOW};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// How admission timestamps are grouped into windows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum WindowKind {
    /// Each admission counts for exactly `window` after it happened
    #[default]
    Rolling,
    /// Windows open at the first admission after the previous one expired
    Fixed,
}

/// Rate limiter configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Admissions allowed per window; zero rejects everything
    pub capacity: usize,
    pub window: Duration,
    /// Minimum gap between two admissions; zero disables spacing
    pub min_spacing: Duration,
    pub kind: WindowKind,
    /// Identifies the policy in events and errors
    pub description: Arc<str>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_RATE_CAPACITY,
            window: DEFAULT_RATE_WINDOW,
            min_spacing: Duration::ZERO,
            kind: WindowKind::Rolling,
            description: Arc::from("rate-limit"),
        }
    }
}

impl RateLimitConfig {
    /// `capacity` admissions per `window`
    pub fn new(capacity: usize, window: Duration) -> Self {
        Self {
            capacity,
            window,
            ..Self::default()
        }
    }

    /// One admission per `interval`, enforced as both capacity and spacing
    pub fn spaced(interval: Duration) -> Self {
        Self {
            capacity: 1,
            window: interval,
            min_spacing: interval,
            ..Self::default()
        }
    }

    pub fn with_min_spacing(mut self, min_spacing: Duration) -> Self {
        self.min_spacing = min_spacing;
        self
    }

    pub fn with_kind(mut self, kind: WindowKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_description(mut self, description: impl Into<Arc<str>>) -> Self {
        self.description = description.into();
        self
    }

    /// Reject configurations no window can honor
    pub fn validate(&self) -> ResilienceResult<()> {
        if self.capacity > 0 && self.window.is_zero() {
            return Err(ResilienceError::configuration(
                self.description.clone(),
                "window must be non-zero when capacity is positive",
            ));
        }
        Ok(())
    }
}
