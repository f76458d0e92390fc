//! Run context for streaming-aware execution.
//!
//! Holds the optional stream sender plus selected stream modes. `invoke` runs without one.

use std::collections::HashSet;
use std::fmt::Debug;

use tokio::sync::mpsc;

use crate::stream::{StreamEvent, StreamMode};

#[derive(Clone)]
pub struct RunContext<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    /// Sender for streaming events.
    pub stream_tx: mpsc::Sender<StreamEvent<S>>,
    /// Enabled stream modes (Values, Updates, Errors).
    pub stream_mode: HashSet<StreamMode>,
}

impl<S> RunContext<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    /// Sends the event when its mode is enabled. A dropped receiver is ignored.
    pub(crate) async fn emit(&self, mode: StreamMode, event: impl FnOnce() -> StreamEvent<S>) {
        if self.stream_mode.contains(&mode) {
            let _ = self.stream_tx.send(event()).await;
        }
    }
}
