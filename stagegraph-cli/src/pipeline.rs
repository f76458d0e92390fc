//! The content pipeline graph.
//!
//! ```text
//! START -> validate_input --failed--> END
//!                         --passed--> parse_product -> generate_faq -> extract_logic
//!          -> generate_comparison -> audit_quality --retry--> generate_faq
//!                                                  --halt---> END
//!                                                  --passed-> assemble_pages -> END
//! ```

use std::sync::Arc;
use std::time::Duration;

use stagegraph::{
    Checkpointer, CompiledStateGraph, FnRouter, GateRoutes, QualityGate, StateGraph,
    TopologyError, END, MAX_ITERATIONS, START,
};

use crate::llm::StructuredLlm;
use crate::middleware::WithStageLogging;
use crate::stages::{
    faq_count_contract, ids, route_after_validation, AssemblePages, AuditQuality,
    ExtractLogic, GenerateComparison, GenerateFaq, ParseProduct, TemplateStore, ValidateInput,
    VALIDATION_FAILED, VALIDATION_PASSED,
};
use crate::state::PipelineState;

/// Collaborators and knobs for one pipeline graph.
#[derive(Clone)]
pub struct PipelineDeps {
    pub llm: StructuredLlm,
    pub templates: Arc<TemplateStore>,
    pub max_iterations: u32,
    /// Force-pass threshold of the audit gate; `None` disables it.
    pub accept_after: Option<u32>,
    /// Per-stage time budget.
    pub stage_timeout: Option<Duration>,
}

impl PipelineDeps {
    pub fn new(llm: StructuredLlm, templates: Arc<TemplateStore>) -> Self {
        Self {
            llm,
            templates,
            max_iterations: MAX_ITERATIONS,
            accept_after: None,
            stage_timeout: None,
        }
    }
}

/// Builds the seven-stage graph with stage logging attached.
pub fn build_pipeline(deps: &PipelineDeps) -> StateGraph<PipelineState> {
    let gate = QualityGate::new(Arc::new(AuditQuality::new(deps.llm.clone())))
        .with_contract(faq_count_contract)
        .with_max_iterations(deps.max_iterations)
        .with_accept_after(deps.accept_after);

    let mut graph = StateGraph::<PipelineState>::new();
    graph
        .add_node(ids::VALIDATE_INPUT, Arc::new(ValidateInput))
        .add_node(ids::PARSE_PRODUCT, Arc::new(ParseProduct::new(deps.llm.clone())))
        .add_node(ids::GENERATE_FAQ, Arc::new(GenerateFaq::new(deps.llm.clone())))
        .add_node(ids::EXTRACT_LOGIC, Arc::new(ExtractLogic::new(deps.llm.clone())))
        .add_node(
            ids::GENERATE_COMPARISON,
            Arc::new(GenerateComparison::new(deps.llm.clone())),
        )
        .add_node(
            ids::ASSEMBLE_PAGES,
            Arc::new(AssemblePages::new(deps.templates.clone())),
        );

    graph
        .add_edge(START, ids::VALIDATE_INPUT)
        .add_conditional_edges(
            ids::VALIDATE_INPUT,
            Arc::new(FnRouter::<PipelineState, _>::new(
                &[VALIDATION_PASSED, VALIDATION_FAILED],
                route_after_validation,
            )),
            [
                (VALIDATION_PASSED, ids::PARSE_PRODUCT),
                (VALIDATION_FAILED, END),
            ],
        )
        .add_edge(ids::PARSE_PRODUCT, ids::GENERATE_FAQ)
        .add_edge(ids::GENERATE_FAQ, ids::EXTRACT_LOGIC)
        .add_edge(ids::EXTRACT_LOGIC, ids::GENERATE_COMPARISON)
        .add_edge(ids::GENERATE_COMPARISON, ids::AUDIT_QUALITY)
        .add_quality_gate(
            ids::AUDIT_QUALITY,
            gate,
            GateRoutes::new(ids::GENERATE_FAQ, ids::ASSEMBLE_PAGES, END),
        )
        .add_edge(ids::ASSEMBLE_PAGES, END);

    graph.with_stage_logging(deps.stage_timeout)
}

/// Builds and compiles the pipeline with a checkpointer.
pub fn compile_pipeline(
    deps: &PipelineDeps,
    checkpointer: Arc<dyn Checkpointer<PipelineState>>,
) -> Result<CompiledStateGraph<PipelineState>, TopologyError> {
    build_pipeline(deps).compile_with_checkpointer(checkpointer)
}
