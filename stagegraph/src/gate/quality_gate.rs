//! QualityGate: bounded retry controller around an evaluator.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::StageError;
use crate::graph::{Router, Stage};
use crate::state::{GateRecord, GateState};

use super::{Evaluator, GateOutcome, Verdict, MAX_ITERATIONS, PASSED};

/// Structural contract on the loop's primary artifact (e.g. "exactly N items").
///
/// `Err(reason)` means the artifact is structurally invalid; the gate retries without
/// calling the evaluator.
pub type ContractCheck<S> = Arc<dyn Fn(&S) -> Result<(), String> + Send + Sync>;

/// Bounded retry controller: "retry until pass or `max_iterations` traversals, then halt".
///
/// Two separate thresholds:
/// - `max_iterations` stops retrying (outcome `halt`).
/// - `accept_after` (disabled unless set) declares a failed evaluation as passed once the
///   loop has already run that many times. It only applies to evaluator verdicts, never to
///   contract violations, and is logged as a warning whenever it fires.
pub struct QualityGate<S: GateState> {
    evaluator: Arc<dyn Evaluator<S>>,
    contract: Option<ContractCheck<S>>,
    max_iterations: u32,
    accept_after: Option<u32>,
}

impl<S: GateState> QualityGate<S> {
    pub fn new(evaluator: Arc<dyn Evaluator<S>>) -> Self {
        Self {
            evaluator,
            contract: None,
            max_iterations: MAX_ITERATIONS,
            accept_after: None,
        }
    }

    pub fn with_contract(
        mut self,
        check: impl Fn(&S) -> Result<(), String> + Send + Sync + 'static,
    ) -> Self {
        self.contract = Some(Arc::new(check));
        self
    }

    /// Caps loop traversals. Values below 1 are raised to 1.
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    pub fn with_accept_after(mut self, traversals: Option<u32>) -> Self {
        self.accept_after = traversals;
        self
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    /// Routing decision for a given iteration count and feedback.
    pub fn decide(&self, iteration_count: u32, feedback: Option<&str>) -> GateOutcome {
        if iteration_count >= self.max_iterations {
            GateOutcome::Halt
        } else if feedback == Some(PASSED) {
            GateOutcome::Passed
        } else {
            GateOutcome::Retry
        }
    }

    /// One traversal: contract check, evaluation, counter bump, halt bookkeeping.
    pub(crate) async fn traverse(&self, state: &S) -> GateRecord {
        let previous = state.iteration_count();
        let iteration_count = previous.saturating_add(1);

        let contract = self.contract.as_ref().map(|check| check(state));
        let (verdict, forced_pass) = match contract {
            Some(Err(reason)) => {
                tracing::info!(iteration_count, %reason, "Gate contract check failed; skipping evaluation");
                (Verdict::fail(format!("CONTRACT_VIOLATION: {reason}")), false)
            }
            _ => {
                let verdict = match self.evaluator.evaluate(state).await {
                    Ok(v) => v,
                    Err(e) => {
                        tracing::warn!(iteration_count, error = %e, "Gate evaluator failed");
                        Verdict::fail(format!("EVALUATION_FAILED: {e}"))
                    }
                };
                let forced = !verdict.passed && self.accept_after.is_some_and(|n| previous >= n);
                if forced {
                    tracing::warn!(
                        iteration_count,
                        feedback = %verdict.feedback,
                        "Gate accept_after threshold reached; accepting a failed evaluation"
                    );
                }
                (verdict, forced)
            }
        };

        let feedback = if verdict.passed || forced_pass {
            PASSED.to_string()
        } else {
            verdict.feedback
        };
        let outcome = self.decide(iteration_count, Some(&feedback));
        let halted = (outcome == GateOutcome::Halt).then(|| {
            if feedback == PASSED {
                format!(
                    "quality gate passed on iteration {iteration_count} but the cap of {} iterations was reached",
                    self.max_iterations
                )
            } else {
                format!(
                    "quality gate halted after {iteration_count} of {} iterations; last feedback: {feedback}",
                    self.max_iterations
                )
            }
        });
        tracing::info!(iteration_count, %outcome, %feedback, "Quality gate evaluated");

        GateRecord {
            feedback,
            iteration_count,
            halted,
            forced_pass,
        }
    }
}

/// Stage half of a registered gate.
pub(crate) struct GateStage<S: GateState> {
    pub(crate) id: String,
    pub(crate) gate: Arc<QualityGate<S>>,
}

#[async_trait]
impl<S: GateState> Stage<S> for GateStage<S> {
    fn id(&self) -> &str {
        &self.id
    }

    fn writes(&self) -> &[&'static str] {
        S::GATE_FIELDS
    }

    async fn apply(&self, state: &S) -> Result<Vec<S::Update>, StageError> {
        Ok(S::gate_updates(self.gate.traverse(state).await))
    }
}

/// Edge half of a registered gate.
pub(crate) struct GateRouter<S: GateState> {
    pub(crate) gate: Arc<QualityGate<S>>,
    pub(crate) outcomes: [&'static str; 3],
}

impl<S: GateState> GateRouter<S> {
    pub(crate) fn new(gate: Arc<QualityGate<S>>) -> Self {
        Self {
            gate,
            outcomes: GateOutcome::ALL.map(GateOutcome::label),
        }
    }
}

impl<S: GateState> Router<S> for GateRouter<S> {
    fn outcomes(&self) -> &[&'static str] {
        &self.outcomes
    }

    fn route(&self, state: &S) -> &'static str {
        self.gate
            .decide(state.iteration_count(), state.feedback())
            .label()
    }
}
