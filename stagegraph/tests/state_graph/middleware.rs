//! Stage middleware: with_middleware().compile() wraps every stage call.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use stagegraph::{RunnableConfig, StageCall, StageError, StageMiddleware, Verdict};

use crate::common::{doc_graph, review_gate, Doc, DocUpdate, ScriptedDraft, ScriptedReview};

/// Records node ids in call order, then runs the stage.
struct Recorder {
    seen: Mutex<Vec<String>>,
}

#[async_trait]
impl StageMiddleware<Doc> for Recorder {
    async fn around_apply(
        &self,
        node_id: &str,
        state: Doc,
        inner: StageCall<Doc>,
    ) -> Result<Vec<DocUpdate>, StageError> {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(node_id.to_string());
        }
        inner(state).await
    }
}

/// **Scenario**: middleware sees every stage, including the gate, in execution order.
#[tokio::test]
async fn middleware_wraps_every_stage() {
    let recorder = Arc::new(Recorder {
        seen: Mutex::new(Vec::new()),
    });
    let compiled = doc_graph(
        ScriptedDraft::new(vec![3]),
        review_gate(ScriptedReview::always(Verdict::pass())),
    )
    .with_middleware(recorder.clone())
    .compile()
    .unwrap();

    let out = compiled
        .invoke(Doc::about("tea"), &RunnableConfig::new("mw"))
        .await
        .unwrap();

    assert!(out.published);
    let seen = recorder.seen.lock().unwrap().clone();
    assert_eq!(seen, vec!["outline", "draft", "review", "publish"]);
}

/// Fails the draft stage without running it, as a timeout layer would.
struct DraftTimesOut;

#[async_trait]
impl StageMiddleware<Doc> for DraftTimesOut {
    async fn around_apply(
        &self,
        node_id: &str,
        state: Doc,
        inner: StageCall<Doc>,
    ) -> Result<Vec<DocUpdate>, StageError> {
        if node_id == "draft" {
            return Err(StageError::Timeout(Duration::from_secs(1)));
        }
        inner(state).await
    }
}

/// **Scenario**: an error returned by middleware is recorded like a stage failure.
#[tokio::test]
async fn middleware_error_is_recorded_as_stage_failure() {
    let draft = ScriptedDraft::new(vec![3]);
    let compiled = doc_graph(
        draft.clone(),
        review_gate(ScriptedReview::always(Verdict::pass())).with_max_iterations(1),
    )
    .with_middleware(Arc::new(DraftTimesOut))
    .compile()
    .unwrap();

    let out = compiled
        .invoke(Doc::about("tea"), &RunnableConfig::new("slow"))
        .await
        .unwrap();

    assert_eq!(draft.calls(), 0);
    assert!(out.errors[0].starts_with("draft:"), "{:?}", out.errors);
    assert!(out.errors[0].contains("timed out"), "{:?}", out.errors);
    assert!(!out.published);
}
