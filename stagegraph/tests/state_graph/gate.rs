//! Quality gate loop: bounded retry, contract check, evaluator failures, accept_after.

use stagegraph::{RunnableConfig, StageError, Verdict, MAX_ITERATIONS};

use crate::common::{doc_graph, review_gate, Doc, ScriptedDraft, ScriptedReview};

async fn run(draft: &std::sync::Arc<ScriptedDraft>, gate: stagegraph::QualityGate<Doc>) -> Doc {
    doc_graph(draft.clone(), gate)
        .compile()
        .expect("doc graph compiles")
        .invoke(Doc::about("soap"), &RunnableConfig::new("gate"))
        .await
        .expect("run completes")
}

/// **Scenario**: one failed review then a pass: the loop body runs twice.
#[tokio::test]
async fn retry_once_then_pass() {
    let draft = ScriptedDraft::new(vec![3]);
    let review = ScriptedReview::new(vec![Ok(Verdict::fail("too short")), Ok(Verdict::pass())]);

    let out = run(&draft, review_gate(review.clone())).await;

    assert_eq!(draft.calls(), 2);
    assert_eq!(review.calls(), 2);
    assert_eq!(out.iteration_count, 2);
    assert_eq!(out.feedback.as_deref(), Some("PASSED"));
    assert!(out.published);
    assert!(out.errors.is_empty());
}

/// **Scenario**: a review that never passes is retried at most MAX_ITERATIONS times, then the
/// gate halts the run with exactly one error.
#[tokio::test]
async fn always_failing_review_halts_after_cap() {
    let draft = ScriptedDraft::new(vec![3]);
    let review = ScriptedReview::always(Verdict::fail("missing citations"));

    let out = run(&draft, review_gate(review.clone())).await;

    assert_eq!(draft.calls(), MAX_ITERATIONS as usize);
    assert_eq!(out.iteration_count, MAX_ITERATIONS);
    assert_eq!(out.feedback.as_deref(), Some("missing citations"));
    assert!(!out.published);
    assert_eq!(out.errors.len(), 1, "{:?}", out.errors);
    assert!(out.errors[0].contains("missing citations"), "{}", out.errors[0]);
}

/// **Scenario**: a contract violation skips the evaluator and feeds the reason back.
#[tokio::test]
async fn contract_violation_retries_without_evaluating() {
    let draft = ScriptedDraft::new(vec![2, 3]);
    let review = ScriptedReview::always(Verdict::pass());

    let out = run(&draft, review_gate(review.clone())).await;

    assert_eq!(draft.calls(), 2);
    assert_eq!(review.calls(), 1, "evaluator only runs once the contract holds");
    assert_eq!(out.iteration_count, 2);
    assert!(out.published);
}

/// **Scenario**: contract feedback is visible to the stage that retries.
#[tokio::test]
async fn contract_feedback_is_recorded() {
    let draft = ScriptedDraft::new(vec![5]);
    let review = ScriptedReview::always(Verdict::pass());

    let out = run(&draft, review_gate(review.clone())).await;

    assert_eq!(review.calls(), 0);
    let feedback = out.feedback.unwrap_or_default();
    assert!(feedback.starts_with("CONTRACT_VIOLATION"), "{}", feedback);
    assert!(feedback.contains("got 5"), "{}", feedback);
    assert!(!out.published);
}

/// **Scenario**: an evaluator error is a failed verdict, not a stage error; the loop retries.
#[tokio::test]
async fn evaluator_error_counts_as_failed_review() {
    let draft = ScriptedDraft::new(vec![3]);
    let review = ScriptedReview::new(vec![
        Err(StageError::failed("reviewer unavailable")),
        Ok(Verdict::pass()),
    ]);

    let out = run(&draft, review_gate(review.clone())).await;

    assert_eq!(draft.calls(), 2);
    assert!(out.published);
    assert!(out.errors.is_empty(), "{:?}", out.errors);
}

/// **Scenario**: a pass on the final permitted traversal still halts: the cap is checked
/// before the feedback.
#[tokio::test]
async fn pass_on_final_traversal_halts() {
    let draft = ScriptedDraft::new(vec![3]);
    let review = ScriptedReview::new(vec![
        Ok(Verdict::fail("a")),
        Ok(Verdict::fail("b")),
        Ok(Verdict::pass()),
    ]);

    let out = run(&draft, review_gate(review.clone())).await;

    assert_eq!(out.iteration_count, MAX_ITERATIONS);
    assert_eq!(out.feedback.as_deref(), Some("PASSED"));
    assert!(!out.published);
    assert_eq!(out.errors.len(), 1);
}

/// **Scenario**: with_max_iterations(1) allows a single attempt.
#[tokio::test]
async fn single_iteration_cap() {
    let draft = ScriptedDraft::new(vec![3]);
    let review = ScriptedReview::always(Verdict::fail("nope"));

    let out = run(&draft, review_gate(review).with_max_iterations(1)).await;

    assert_eq!(draft.calls(), 1);
    assert_eq!(out.iteration_count, 1);
    assert_eq!(out.errors.len(), 1);
}

/// **Scenario**: accept_after forces a pass once the loop already ran that many times.
#[tokio::test]
async fn accept_after_forces_pass() {
    let draft = ScriptedDraft::new(vec![3]);
    let review = ScriptedReview::always(Verdict::fail("minor issues"));

    let out = run(&draft, review_gate(review).with_accept_after(Some(1))).await;

    assert_eq!(draft.calls(), 2);
    assert_eq!(out.iteration_count, 2);
    assert_eq!(out.feedback.as_deref(), Some("PASSED"));
    assert!(out.published);
}
