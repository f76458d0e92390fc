//! Shared state type and helpers for StateGraph integration tests.
//!
//! `Doc` models a tiny write-review loop: outline → draft → review (quality gate) → publish.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use stagegraph::{
    CompiledStateGraph, Evaluator, FnRouter, FnStage, GateRecord, GateRoutes, GateState,
    GraphState, QualityGate, SchemaViolation, Stage, StageError, StateGraph, Verdict, END, START,
};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Doc {
    pub topic: String,
    pub outline: Vec<String>,
    pub draft: Vec<String>,
    pub feedback: Option<String>,
    pub iteration_count: u32,
    pub published: bool,
    pub errors: Vec<String>,
}

impl Doc {
    pub fn about(topic: &str) -> Self {
        Self {
            topic: topic.to_string(),
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug)]
pub enum DocUpdate {
    Outline(Vec<String>),
    Draft(Vec<String>),
    Feedback(String),
    Iteration(u32),
    Published(bool),
    Error(String),
}

impl GraphState for Doc {
    type Update = DocUpdate;

    fn field_of(update: &DocUpdate) -> &'static str {
        match update {
            DocUpdate::Outline(_) => "outline",
            DocUpdate::Draft(_) => "draft",
            DocUpdate::Feedback(_) => "feedback",
            DocUpdate::Iteration(_) => "iteration_count",
            DocUpdate::Published(_) => "published",
            DocUpdate::Error(_) => "errors",
        }
    }

    fn shared_fields() -> &'static [&'static str] {
        &["errors"]
    }

    fn merge(&self, update: DocUpdate) -> Result<Self, SchemaViolation> {
        let mut next = self.clone();
        match update {
            DocUpdate::Outline(v) => next.outline = v,
            DocUpdate::Draft(v) => next.draft = v,
            DocUpdate::Feedback(f) => next.feedback = Some(f),
            DocUpdate::Iteration(n) => {
                if n < self.iteration_count {
                    return Err(SchemaViolation::new(
                        "iteration_count",
                        format!("cannot decrease from {} to {}", self.iteration_count, n),
                    ));
                }
                next.iteration_count = n;
            }
            DocUpdate::Published(p) => next.published = p,
            DocUpdate::Error(e) => next.errors.push(e),
        }
        Ok(next)
    }

    fn stage_failed(stage: &str, error: &StageError) -> DocUpdate {
        DocUpdate::Error(format!("{stage}: {error}"))
    }
}

impl GateState for Doc {
    const GATE_FIELDS: &'static [&'static str] = &["feedback", "iteration_count"];

    fn iteration_count(&self) -> u32 {
        self.iteration_count
    }

    fn feedback(&self) -> Option<&str> {
        self.feedback.as_deref()
    }

    fn gate_updates(record: GateRecord) -> Vec<DocUpdate> {
        let mut out = vec![
            DocUpdate::Feedback(record.feedback),
            DocUpdate::Iteration(record.iteration_count),
        ];
        if let Some(message) = record.halted {
            out.push(DocUpdate::Error(message));
        }
        out
    }
}

/// Outline stage: fails on an empty topic.
pub fn outline_stage() -> Arc<dyn Stage<Doc>> {
    Arc::new(FnStage::new("outline", &["outline"], |s: Doc| async move {
        if s.topic.is_empty() {
            return Err(StageError::failed("topic is required"));
        }
        Ok(vec![DocUpdate::Outline(vec![format!("intro to {}", s.topic)])])
    }))
}

pub fn publish_stage() -> Arc<dyn Stage<Doc>> {
    Arc::new(FnStage::new("publish", &["published"], |_s: Doc| async {
        Ok(vec![DocUpdate::Published(true)])
    }))
}

/// Draft stage producing a scripted number of paragraphs per call (last entry repeats).
pub struct ScriptedDraft {
    script: Vec<usize>,
    pub calls: AtomicUsize,
}

impl ScriptedDraft {
    pub fn new(script: Vec<usize>) -> Arc<Self> {
        Arc::new(Self {
            script,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Stage<Doc> for ScriptedDraft {
    fn id(&self) -> &str {
        "draft"
    }

    fn writes(&self) -> &[&'static str] {
        &["draft"]
    }

    async fn apply(&self, state: &Doc) -> Result<Vec<DocUpdate>, StageError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let n = self
            .script
            .get(call)
            .or(self.script.last())
            .copied()
            .unwrap_or(0);
        let draft = (0..n)
            .map(|i| format!("{} paragraph {}", state.topic, i + 1))
            .collect();
        Ok(vec![DocUpdate::Draft(draft)])
    }
}

/// Evaluator returning scripted verdicts (last entry repeats).
pub struct ScriptedReview {
    script: Vec<Result<Verdict, StageError>>,
    pub calls: AtomicUsize,
}

impl ScriptedReview {
    pub fn new(script: Vec<Result<Verdict, StageError>>) -> Arc<Self> {
        Arc::new(Self {
            script,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn always(verdict: Verdict) -> Arc<Self> {
        Self::new(vec![Ok(verdict)])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Evaluator<Doc> for ScriptedReview {
    async fn evaluate(&self, _state: &Doc) -> Result<Verdict, StageError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .get(call)
            .or(self.script.last())
            .cloned()
            .unwrap_or_else(|| Ok(Verdict::pass()))
    }
}

/// Contract used by the review gate: a draft has exactly three paragraphs.
pub fn three_paragraphs(state: &Doc) -> Result<(), String> {
    match state.draft.len() {
        3 => Ok(()),
        n => Err(format!("expected 3 paragraphs, got {n}")),
    }
}

/// outline → (errors? END : draft) → review gate {retry: draft, passed: publish, halt: END}.
pub fn doc_graph(draft: Arc<ScriptedDraft>, gate: QualityGate<Doc>) -> StateGraph<Doc> {
    let mut graph = StateGraph::<Doc>::new();
    graph.add_node("outline", outline_stage());
    graph.add_node("draft", draft);
    graph.add_node("publish", publish_stage());
    graph.add_edge(START, "outline");
    graph.add_conditional_edges(
        "outline",
        Arc::new(FnRouter::new(&["failed", "ok"], |s: &Doc| {
            if s.errors.is_empty() {
                "ok"
            } else {
                "failed"
            }
        })),
        [("failed", END), ("ok", "draft")],
    );
    graph.add_edge("draft", "review");
    graph.add_quality_gate("review", gate, GateRoutes::new("draft", "publish", END));
    graph.add_edge("publish", END);
    graph
}

pub fn review_gate(review: Arc<ScriptedReview>) -> QualityGate<Doc> {
    QualityGate::<Doc>::new(review).with_contract(three_paragraphs)
}

pub fn compiled_doc_graph(
    draft: Arc<ScriptedDraft>,
    review: Arc<ScriptedReview>,
) -> CompiledStateGraph<Doc> {
    doc_graph(draft, review_gate(review))
        .compile()
        .expect("doc graph compiles")
}
