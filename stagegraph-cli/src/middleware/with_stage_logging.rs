//! Extension trait for the fluent API: attach stage logging (and an optional time budget)
//! before compiling.

use std::sync::Arc;
use std::time::Duration;

use stagegraph::{GraphState, StateGraph};

use super::{LoggingMiddleware, TimeoutMiddleware};

pub trait WithStageLogging {
    /// Returns the same graph with `LoggingMiddleware` attached, wrapped in a
    /// `TimeoutMiddleware` when `timeout` is set. Chain with `.compile()?`.
    fn with_stage_logging(self, timeout: Option<Duration>) -> Self;
}

impl<S: GraphState> WithStageLogging for StateGraph<S> {
    fn with_stage_logging(self, timeout: Option<Duration>) -> Self {
        match timeout {
            Some(budget) => self.with_middleware(Arc::new(
                TimeoutMiddleware::new(budget).wrapping(Arc::new(LoggingMiddleware)),
            )),
            None => self.with_middleware(Arc::new(LoggingMiddleware)),
        }
    }
}
