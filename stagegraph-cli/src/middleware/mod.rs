//! Stage middleware for the pipeline graph.
//!
//! Re-exports [`LoggingMiddleware`], [`TimeoutMiddleware`] and [`WithStageLogging`].

mod logging;
mod timeout;
mod with_stage_logging;

pub use logging::LoggingMiddleware;
pub use timeout::TimeoutMiddleware;
pub use with_stage_logging::WithStageLogging;
