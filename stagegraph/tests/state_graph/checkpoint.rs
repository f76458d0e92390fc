//! Checkpointing: per-stage history, resume of finished runs, SQLite durability, write failures.

use std::sync::Arc;

use async_trait::async_trait;
use stagegraph::{
    Checkpoint, CheckpointError, CheckpointListItem, CheckpointSource, Checkpointer, MemorySaver,
    RunError, RunnableConfig, Verdict,
};

use crate::common::{doc_graph, review_gate, Doc, ScriptedDraft, ScriptedReview};

/// **Scenario**: every stage visit is checkpointed after the input snapshot; the last
/// checkpoint is terminal and equals the returned state.
#[tokio::test]
async fn history_has_one_checkpoint_per_stage() {
    let saver = Arc::new(MemorySaver::<Doc>::new());
    let compiled = doc_graph(
        ScriptedDraft::new(vec![3]),
        review_gate(ScriptedReview::new(vec![
            Ok(Verdict::fail("again")),
            Ok(Verdict::pass()),
        ])),
    )
    .compile_with_checkpointer(saver.clone())
    .unwrap();

    let out = compiled
        .invoke(Doc::about("tea"), &RunnableConfig::new("hist"))
        .await
        .unwrap();

    let history = saver.list("hist").await.unwrap();
    let visited: Vec<Option<&str>> = history
        .iter()
        .map(|item| item.metadata.node_id.as_deref())
        .collect();
    assert_eq!(
        visited,
        vec![
            None,
            Some("outline"),
            Some("draft"),
            Some("review"),
            Some("draft"),
            Some("review"),
            Some("publish"),
        ]
    );
    assert_eq!(history[0].metadata.source, CheckpointSource::Input);
    assert_eq!(history[3].metadata.next.as_deref(), Some("draft"));
    let steps: Vec<u64> = history.iter().map(|i| i.metadata.step).collect();
    assert_eq!(steps, vec![0, 1, 2, 3, 4, 5, 6]);

    let latest = saver.get("hist").await.unwrap().unwrap();
    assert!(latest.is_terminal());
    assert_eq!(latest.state, out);
}

/// **Scenario**: resuming a finished run returns its final state without rerunning stages.
#[tokio::test]
async fn resume_finished_run_returns_final_state() {
    let draft = ScriptedDraft::new(vec![3]);
    let saver = Arc::new(MemorySaver::<Doc>::new());
    let compiled = doc_graph(
        draft.clone(),
        review_gate(ScriptedReview::always(Verdict::pass())),
    )
    .compile_with_checkpointer(saver)
    .unwrap();
    let config = RunnableConfig::new("done");

    let out = compiled.invoke(Doc::about("tea"), &config).await.unwrap();
    let resumed = compiled.resume(&config).await.unwrap();

    assert_eq!(resumed, out);
    assert_eq!(draft.calls(), 1);
}

/// **Scenario**: a run's final state survives reopening the SQLite file.
#[cfg(feature = "sqlite")]
#[tokio::test]
async fn sqlite_checkpoint_survives_reopen() {
    use stagegraph::SqliteSaver;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("runs.db");
    let out = {
        let saver = Arc::new(SqliteSaver::<Doc>::open(&path).unwrap());
        doc_graph(
            ScriptedDraft::new(vec![3]),
            review_gate(ScriptedReview::always(Verdict::pass())),
        )
        .compile_with_checkpointer(saver)
        .unwrap()
        .invoke(Doc::about("ink"), &RunnableConfig::new("durable"))
        .await
        .unwrap()
    };

    let reopened = SqliteSaver::<Doc>::open(&path).unwrap();
    let loaded = reopened.load("durable").await.unwrap();
    assert_eq!(loaded, Some(out));
    assert_eq!(reopened.list("durable").await.unwrap().len(), 5);
}

/// Checkpointer whose writes always fail.
struct BrokenSaver;

#[async_trait]
impl Checkpointer<Doc> for BrokenSaver {
    async fn put(&self, _run_id: &str, _cp: &Checkpoint<Doc>) -> Result<(), CheckpointError> {
        Err(CheckpointError::Storage("disk full".into()))
    }

    async fn get(&self, _run_id: &str) -> Result<Option<Checkpoint<Doc>>, CheckpointError> {
        Ok(None)
    }

    async fn list(&self, _run_id: &str) -> Result<Vec<CheckpointListItem>, CheckpointError> {
        Ok(Vec::new())
    }

    async fn delete(&self, _run_id: &str) -> Result<usize, CheckpointError> {
        Ok(0)
    }
}

/// **Scenario**: a failed checkpoint write aborts the run instead of silently losing state.
#[tokio::test]
async fn checkpoint_write_failure_aborts_run() {
    let draft = ScriptedDraft::new(vec![3]);
    let compiled = doc_graph(
        draft.clone(),
        review_gate(ScriptedReview::always(Verdict::pass())),
    )
    .compile_with_checkpointer(Arc::new(BrokenSaver))
    .unwrap();

    let err = compiled
        .invoke(Doc::about("tea"), &RunnableConfig::new("broken"))
        .await
        .unwrap_err();

    assert!(matches!(err, RunError::Checkpoint(_)), "{:?}", err);
    assert_eq!(draft.calls(), 0);
}
