//! Gate outcomes and their destinations.

use std::fmt;

/// Decision of a quality gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GateOutcome {
    /// Evaluation failed and attempts remain: re-enter the loop body.
    Retry,
    /// Iteration cap reached: stop retrying.
    Halt,
    Passed,
}

impl GateOutcome {
    pub const ALL: [GateOutcome; 3] = [GateOutcome::Retry, GateOutcome::Halt, GateOutcome::Passed];

    /// Routing label used on the conditional edge.
    pub const fn label(self) -> &'static str {
        match self {
            GateOutcome::Retry => "retry",
            GateOutcome::Halt => "halt",
            GateOutcome::Passed => "passed",
        }
    }
}

impl fmt::Display for GateOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Destinations for the three gate outcomes. Use `END` to stop the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateRoutes {
    /// Node earlier in the graph that starts the loop body again.
    pub retry: String,
    pub passed: String,
    pub halt: String,
}

impl GateRoutes {
    pub fn new(
        retry: impl Into<String>,
        passed: impl Into<String>,
        halt: impl Into<String>,
    ) -> Self {
        Self {
            retry: retry.into(),
            passed: passed.into(),
            halt: halt.into(),
        }
    }

    pub(crate) fn into_pairs(self) -> Vec<(String, String)> {
        vec![
            (GateOutcome::Retry.label().to_string(), self.retry),
            (GateOutcome::Halt.label().to_string(), self.halt),
            (GateOutcome::Passed.label().to_string(), self.passed),
        ]
    }
}
