use async_trait::async_trait;
use stagegraph::{Stage, StageError};

use super::ids;
use crate::schemas::RawProductInput;
use crate::state::{PipelineState, PipelineUpdate};

pub const VALIDATION_PASSED: &str = "passed";
pub const VALIDATION_FAILED: &str = "failed";

/// Entry stage: checks the raw input against the input contract.
///
/// A bad input is a normal outcome, not a stage error: the stage appends
/// `Invalid input data: ...` and [`route_after_validation`] ends the run.
pub struct ValidateInput;

#[async_trait]
impl Stage<PipelineState> for ValidateInput {
    fn id(&self) -> &str {
        ids::VALIDATE_INPUT
    }

    async fn apply(&self, state: &PipelineState) -> Result<Vec<PipelineUpdate>, StageError> {
        match RawProductInput::validate(&state.input) {
            Ok(input) => {
                tracing::info!(title = %input.title, "Raw input validated");
                Ok(Vec::new())
            }
            Err(reason) => {
                tracing::error!(%reason, "Input validation failed");
                Ok(vec![PipelineUpdate::error(format!(
                    "Invalid input data: {reason}"
                ))])
            }
        }
    }
}

/// Router after `validate_input`: any error so far means the input was rejected.
pub fn route_after_validation(state: &PipelineState) -> &'static str {
    if state.errors.is_empty() {
        VALIDATION_PASSED
    } else {
        VALIDATION_FAILED
    }
}
