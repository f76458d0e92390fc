//! Evaluator: the semantic check a quality gate runs once the structural contract holds.

use async_trait::async_trait;

use crate::error::StageError;
use crate::state::GraphState;

/// Result of one evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub passed: bool,
    /// Reason for a failed verdict; ignored on pass.
    pub feedback: String,
}

impl Verdict {
    pub fn pass() -> Self {
        Self {
            passed: true,
            feedback: super::PASSED.to_string(),
        }
    }

    pub fn fail(feedback: impl Into<String>) -> Self {
        Self {
            passed: false,
            feedback: feedback.into(),
        }
    }
}

/// Judges the loop's output. Implemented by collaborators (e.g. a model-backed auditor).
///
/// An `Err` is not recorded as a stage failure: the gate turns it into a failed verdict so
/// the loop retries.
#[async_trait]
pub trait Evaluator<S: GraphState>: Send + Sync {
    async fn evaluate(&self, state: &S) -> Result<Verdict, StageError>;
}
