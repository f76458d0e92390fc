//! StateGraph compile failure cases: unknown node, entry, routes, reachability, ownership.

use std::sync::Arc;

use stagegraph::{FnRouter, FnStage, GateRoutes, StateGraph, TopologyError, END, START};

use crate::common::{
    outline_stage, publish_stage, review_gate, Doc, DocUpdate, ScriptedDraft, ScriptedReview,
};

#[tokio::test]
async fn compile_fails_when_edge_refers_to_unknown_node() {
    let mut graph = StateGraph::<Doc>::new();
    graph.add_node("outline", outline_stage());
    graph.add_edge(START, "outline");
    graph.add_edge("outline", "missing");

    match graph.compile() {
        Err(TopologyError::NodeNotFound(id)) => assert_eq!(id, "missing"),
        other => panic!("expected NodeNotFound, got {:?}", other.err()),
    }
}

/// **Scenario**: a graph without an edge from START has no entry.
#[tokio::test]
async fn compile_fails_without_entry() {
    let mut graph = StateGraph::<Doc>::new();
    graph.add_node("outline", outline_stage());
    graph.add_edge("outline", END);

    assert_eq!(graph.compile().err(), Some(TopologyError::MissingEntry));
}

#[tokio::test]
async fn compile_fails_with_two_entries() {
    let mut graph = StateGraph::<Doc>::new();
    graph.add_node("outline", outline_stage());
    graph.add_node("publish", publish_stage());
    graph.add_edge(START, "outline");
    graph.add_edge(START, "publish");
    graph.add_edge("outline", END);
    graph.add_edge("publish", END);

    assert!(matches!(
        graph.compile(),
        Err(TopologyError::MultipleEntries(ref ids)) if ids.len() == 2
    ));
}

/// **Scenario**: a router outcome without a destination is rejected before any run.
#[tokio::test]
async fn compile_fails_when_router_outcome_has_no_destination() {
    let mut graph = StateGraph::<Doc>::new();
    graph.add_node("outline", outline_stage());
    graph.add_edge(START, "outline");
    graph.add_conditional_edges(
        "outline",
        Arc::new(FnRouter::new(&["ok", "failed"], |_s: &Doc| "ok")),
        [("ok", END)],
    );

    match graph.compile() {
        Err(TopologyError::MissingRoute { node_id, label }) => {
            assert_eq!(node_id, "outline");
            assert_eq!(label, "failed");
        }
        other => panic!("expected MissingRoute, got {:?}", other.err()),
    }
}

#[tokio::test]
async fn compile_fails_when_node_has_no_outgoing_edge() {
    let mut graph = StateGraph::<Doc>::new();
    graph.add_node("outline", outline_stage());
    graph.add_node("publish", publish_stage());
    graph.add_edge(START, "outline");
    graph.add_edge("outline", "publish");

    assert_eq!(
        graph.compile().err(),
        Some(TopologyError::MissingOutgoingEdge("publish".into()))
    );
}

#[tokio::test]
async fn compile_fails_on_direct_and_conditional_edge() {
    let mut graph = StateGraph::<Doc>::new();
    graph.add_node("outline", outline_stage());
    graph.add_edge(START, "outline");
    graph.add_edge("outline", END);
    graph.add_conditional_edges(
        "outline",
        Arc::new(FnRouter::new(&["ok"], |_s: &Doc| "ok")),
        [("ok", END)],
    );

    assert_eq!(
        graph.compile().err(),
        Some(TopologyError::ConflictingEdges("outline".into()))
    );
}

#[tokio::test]
async fn compile_fails_on_two_direct_edges() {
    let mut graph = StateGraph::<Doc>::new();
    graph.add_node("outline", outline_stage());
    graph.add_node("publish", publish_stage());
    graph.add_edge(START, "outline");
    graph.add_edge("outline", "publish");
    graph.add_edge("outline", END);
    graph.add_edge("publish", END);

    assert_eq!(
        graph.compile().err(),
        Some(TopologyError::DuplicateEdge("outline".into()))
    );
}

/// **Scenario**: a registered node no path from the entry reaches is rejected.
#[tokio::test]
async fn compile_fails_on_unreachable_node() {
    let mut graph = StateGraph::<Doc>::new();
    graph.add_node("outline", outline_stage());
    graph.add_node("publish", publish_stage());
    graph.add_edge(START, "outline");
    graph.add_edge("outline", END);
    graph.add_edge("publish", END);

    assert_eq!(
        graph.compile().err(),
        Some(TopologyError::Unreachable("publish".into()))
    );
}

/// **Scenario**: two stages declaring the same non-shared field is a topology error.
#[tokio::test]
async fn compile_fails_when_two_stages_own_one_field() {
    let mut graph = StateGraph::<Doc>::new();
    graph.add_node("outline", outline_stage());
    graph.add_node(
        "rewrite",
        Arc::new(FnStage::new("rewrite", &["outline"], |_s: Doc| async {
            Ok(vec![DocUpdate::Outline(vec![])])
        })),
    );
    graph.add_edge(START, "outline");
    graph.add_edge("outline", "rewrite");
    graph.add_edge("rewrite", END);

    match graph.compile() {
        Err(TopologyError::SharedField {
            field,
            first,
            second,
        }) => {
            assert_eq!(field, "outline");
            assert_eq!(first, "outline");
            assert_eq!(second, "rewrite");
        }
        other => panic!("expected SharedField, got {:?}", other.err()),
    }
}

/// **Scenario**: appending to the shared errors field from several stages is allowed.
#[tokio::test]
async fn shared_fields_may_be_declared_by_many_stages() {
    let mut graph = StateGraph::<Doc>::new();
    for id in ["a", "b"] {
        graph.add_node(
            id,
            Arc::new(FnStage::new(id, &["errors"], move |_s: Doc| async move {
                Ok(vec![DocUpdate::Error(format!("{id} note"))])
            })),
        );
    }
    graph.add_edge(START, "a");
    graph.add_edge("a", "b");
    graph.add_edge("b", END);

    assert!(graph.compile().is_ok());
}

/// **Scenario**: gate routes are validated like any other conditional edge.
#[tokio::test]
async fn compile_fails_when_gate_retry_target_is_unknown() {
    let mut graph = StateGraph::<Doc>::new();
    graph.add_node("draft", ScriptedDraft::new(vec![3]));
    graph.add_edge(START, "draft");
    graph.add_edge("draft", "review");
    graph.add_quality_gate(
        "review",
        review_gate(ScriptedReview::new(vec![])),
        GateRoutes::new("rewrite", END, END),
    );

    assert_eq!(
        graph.compile().err(),
        Some(TopologyError::NodeNotFound("rewrite".into()))
    );
}
