//! Cooperative cancellation: checked between stages; the checkpoint allows resuming.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use stagegraph::{
    Checkpointer, FnStage, MemorySaver, RunError, RunnableConfig, StateGraph, END, START,
};
use tokio_util::sync::CancellationToken;

use crate::common::{Doc, DocUpdate};

/// **Scenario**: a run cancelled during a stage finishes that stage, stops before the next,
/// and resumes from the checkpoint without rerunning completed stages.
#[tokio::test]
async fn cancelled_run_resumes_from_checkpoint() {
    let token = CancellationToken::new();
    let outline_calls = Arc::new(AtomicUsize::new(0));
    let publish_calls = Arc::new(AtomicUsize::new(0));

    let mut graph = StateGraph::<Doc>::new();
    {
        let token = token.clone();
        let calls = outline_calls.clone();
        graph.add_node(
            "outline",
            Arc::new(FnStage::new("outline", &["outline"], move |s: Doc| {
                let token = token.clone();
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    token.cancel();
                    Ok(vec![DocUpdate::Outline(vec![s.topic])])
                }
            })),
        );
    }
    {
        let calls = publish_calls.clone();
        graph.add_node(
            "publish",
            Arc::new(FnStage::new("publish", &["published"], move |_s: Doc| {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(vec![DocUpdate::Published(true)])
                }
            })),
        );
    }
    graph.add_edge(START, "outline");
    graph.add_edge("outline", "publish");
    graph.add_edge("publish", END);

    let saver = Arc::new(MemorySaver::<Doc>::new());
    let compiled = graph.compile_with_checkpointer(saver.clone()).unwrap();

    let config = RunnableConfig::new("cancel-me").with_cancellation(token);
    let err = compiled
        .invoke(Doc::about("tea"), &config)
        .await
        .unwrap_err();
    match err {
        RunError::Cancelled { run_id, node_id } => {
            assert_eq!(run_id, "cancel-me");
            assert_eq!(node_id, "outline");
        }
        other => panic!("expected Cancelled, got {:?}", other),
    }
    let saved = saver.get("cancel-me").await.unwrap().unwrap();
    assert_eq!(saved.metadata.next.as_deref(), Some("publish"));
    assert_eq!(saved.state.outline, vec!["tea"]);
    assert_eq!(publish_calls.load(Ordering::SeqCst), 0);

    let out = compiled
        .resume(&RunnableConfig::new("cancel-me"))
        .await
        .unwrap();
    assert!(out.published);
    assert_eq!(out.outline, vec!["tea"]);
    assert_eq!(outline_calls.load(Ordering::SeqCst), 1);
    assert_eq!(publish_calls.load(Ordering::SeqCst), 1);
}

/// **Scenario**: cancellation after the last stage does not turn a finished run into an error.
#[tokio::test]
async fn cancel_after_final_stage_still_completes() {
    let token = CancellationToken::new();
    let mut graph = StateGraph::<Doc>::new();
    {
        let token = token.clone();
        graph.add_node(
            "publish",
            Arc::new(FnStage::new("publish", &["published"], move |_s: Doc| {
                let token = token.clone();
                async move {
                    token.cancel();
                    Ok(vec![DocUpdate::Published(true)])
                }
            })),
        );
    }
    graph.add_edge(START, "publish");
    graph.add_edge("publish", END);

    let out = graph
        .compile()
        .unwrap()
        .invoke(
            Doc::about("tea"),
            &RunnableConfig::new("late").with_cancellation(token),
        )
        .await
        .unwrap();
    assert!(out.published);
}
