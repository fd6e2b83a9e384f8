/*!
 * Error Types
 * Classified resilience errors with thiserror and miette support
 *
 * Every strategy in a chain fails with a `ResilienceError`. Synthesized
 * outcomes (rejection, timeout) short-circuit the chain; delegate failures
 * pass through untouched so the original cause stays reachable.
 */

use miette::Diagnostic;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Result type for strategy operations
pub type ResilienceResult<T> = Result<T, ResilienceError>;

/// Errors produced by resilience strategies
///
/// Cloneable so that a resolved [`AsyncResult`](crate::promise::AsyncResult)
/// can hand the same failure to every observer.
#[derive(Error, Debug, Clone, Diagnostic)]
pub enum ResilienceError {
    #[error("{description} rate limit exceeded")]
    #[diagnostic(
        code(rate_limit::rejected),
        help("The policy admitted its full capacity for the current window. Retry later.")
    )]
    AdmissionRejected { description: Arc<str> },

    #[error("{description} timed out after {timeout_ms}ms")]
    #[diagnostic(
        code(timeout::expired),
        help("The delegate did not complete before the watch fired. Its late outcome is discarded.")
    )]
    Timeout { description: Arc<str>, timeout_ms: u64 },

    #[error("Delegate failed: {0}")]
    #[diagnostic(code(execution::delegate_failed))]
    Delegate(Arc<anyhow::Error>),

    #[error("Scheduling failed: {reason}")]
    #[diagnostic(
        code(timer::scheduling_failed),
        help("The timer service or worker pool is shut down or has exhausted its capacity.")
    )]
    SchedulingFailed { reason: Arc<str> },

    #[error("Invalid configuration for {description}: {reason}")]
    #[diagnostic(code(config::invalid))]
    InvalidConfig { description: Arc<str>, reason: Arc<str> },
}

impl ResilienceError {
    /// Create an admission rejection for the named policy
    pub fn rejected(description: impl Into<Arc<str>>) -> Self {
        Self::AdmissionRejected {
            description: description.into(),
        }
    }

    /// Create a timeout error for the named policy
    pub fn timeout(description: impl Into<Arc<str>>, timeout: Duration) -> Self {
        Self::Timeout {
            description: description.into(),
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// Wrap a failure raised by the guarded computation
    pub fn delegate(error: impl Into<anyhow::Error>) -> Self {
        Self::Delegate(Arc::new(error.into()))
    }

    /// Create a scheduling failure
    pub fn scheduling(reason: impl Into<Arc<str>>) -> Self {
        Self::SchedulingFailed {
            reason: reason.into(),
        }
    }

    /// Create a configuration error for the named policy
    pub fn configuration(description: impl Into<Arc<str>>, reason: impl Into<Arc<str>>) -> Self {
        Self::InvalidConfig {
            description: description.into(),
            reason: reason.into(),
        }
    }

    #[inline]
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::AdmissionRejected { .. })
    }

    #[inline]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    #[inline]
    pub fn is_delegate_failure(&self) -> bool {
        matches!(self, Self::Delegate(_))
    }

    #[inline]
    pub fn is_scheduling_failure(&self) -> bool {
        matches!(self, Self::SchedulingFailed { .. })
    }

    /// Description of the policy that synthesized this error, if any
    pub fn policy_description(&self) -> Option<&str> {
        match self {
            Self::AdmissionRejected { description } | Self::Timeout { description, .. } => {
                Some(description)
            }
            _ => None,
        }
    }

    /// Original delegate failure, if this error wraps one
    pub fn delegate_cause(&self) -> Option<&anyhow::Error> {
        match self {
            Self::Delegate(cause) => Some(cause.as_ref()),
            _ => None,
        }
    }

    /// Downcast the delegate failure to its concrete type
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: std::fmt::Display + std::fmt::Debug + Send + Sync + 'static,
    {
        self.delegate_cause().and_then(|cause| cause.downcast_ref::<E>())
    }

    /// Check whether two errors carry the very same delegate failure
    pub fn same_cause(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Delegate(a), Self::Delegate(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}
