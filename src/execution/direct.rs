/*!
 * Direct Execution
 * Innermost strategy running the work on the calling thread
 */

use crate::core::{InvocationContext, ResilienceResult, Strategy};
use crate::monitoring::{Category, Event};
use std::sync::Arc;
use tracing::trace;

/// Chain leaf that invokes the unit of work in place
#[derive(Debug, Clone)]
pub struct Execution {
    description: Arc<str>,
}

impl Execution {
    pub fn new() -> Self {
        Self::named("execution")
    }

    pub fn named(description: impl Into<Arc<str>>) -> Self {
        Self {
            description: description.into(),
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

impl Default for Execution {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Strategy<V> for Execution {
    fn apply(&self, ctx: &InvocationContext<V>) -> ResilienceResult<V> {
        ctx.fire_event(Event::started(Category::Execution, self.description.clone()));
        trace!(strategy = %self.description, "direct execution entered");

        let outcome = ctx.call();

        ctx.fire_event(Event::finished(Category::Execution, self.description.clone()));
        trace!(strategy = %self.description, ok = outcome.is_ok(), "direct execution exited");
        outcome
    }
}
