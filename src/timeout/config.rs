/*!
 * Timeout Configuration
 */

use crate::core::limits::DEFAULT_TIMEOUT;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Timeout policy configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Zero times out immediately without starting the delegate
    pub duration: Duration,
    pub description: Arc<str>,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            duration: DEFAULT_TIMEOUT,
            description: Arc::from("timeout"),
        }
    }
}

impl TimeoutConfig {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            ..Self::default()
        }
    }

    pub fn from_millis(millis: u64) -> Self {
        Self::new(Duration::from_millis(millis))
    }

    pub fn with_description(mut self, description: impl Into<Arc<str>>) -> Self {
        self.description = description.into();
        self
    }
}
