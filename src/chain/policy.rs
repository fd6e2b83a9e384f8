/*!
 * Policy Descriptors
 * Tagged policy configurations a chain is assembled from
 */

use crate::rate_limit::RateLimitConfig;
use crate::timeout::TimeoutConfig;
use serde::{Deserialize, Serialize};

/// One policy layer, listed outermost first when assembling a chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PolicySpec {
    RateLimit(RateLimitConfig),
    Timeout(TimeoutConfig),
}

impl PolicySpec {
    pub fn description(&self) -> &str {
        match self {
            Self::RateLimit(config) => &config.description,
            Self::Timeout(config) => &config.description,
        }
    }

    /// Short policy family name
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RateLimit(_) => "rate_limit",
            Self::Timeout(_) => "timeout",
        }
    }
}

impl From<RateLimitConfig> for PolicySpec {
    fn from(config: RateLimitConfig) -> Self {
        Self::RateLimit(config)
    }
}

impl From<TimeoutConfig> for PolicySpec {
    fn from(config: TimeoutConfig) -> Self {
        Self::Timeout(config)
    }
}
