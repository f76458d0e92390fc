//! Retry / quality gate controller.
//!
//! A quality gate is a stage plus a three-way conditional edge. The stage runs an optional
//! structural contract check, then (only if the contract holds) an [`Evaluator`], and writes
//! the feedback and the incremented iteration count. The edge then routes:
//!
//! 1. `iteration_count >= max_iterations` → `halt` (regardless of feedback)
//! 2. `feedback == PASSED` → `passed`
//! 3. otherwise → `retry` (back into the loop body)
//!
//! The gate stage is the only writer of the iteration count, so each loop traversal bumps it
//! exactly once. Register with `StateGraph::add_quality_gate`.

mod evaluator;
mod outcome;
mod quality_gate;

pub use evaluator::{Evaluator, Verdict};
pub use outcome::{GateOutcome, GateRoutes};
pub use quality_gate::{ContractCheck, QualityGate};

pub(crate) use quality_gate::{GateRouter, GateStage};

/// Default cap on loop traversals.
pub const MAX_ITERATIONS: u32 = 3;

/// Feedback value that marks a passing evaluation.
pub const PASSED: &str = "PASSED";
