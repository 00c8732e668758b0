//! Ingestion pipeline.
//!
//! Adapts a backend's lazy progress sequence for the `ingestion` tool and
//! the standalone `kgraph ingest` command: every status line is forwarded
//! in order, and the first terminal error sentinel ends consumption
//! immediately. Dedup is entirely the backend's concern — this layer always
//! requests `force=true` when driven by the tool surface.

use futures::StreamExt;

use crate::backend::GraphBackend;
use crate::models::ProgressEvent;
use crate::progress::ProgressNotifier;

/// Final verdict of one ingestion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// The progress sequence was exhausted without a sentinel.
    Completed,
    /// The sequence yielded the terminal error sentinel.
    Failed,
}

/// Drive `process_documents` for one path to completion.
///
/// Status events are forwarded to `notifier` strictly in yield order; on the
/// sentinel, consumption stops before pulling any further items.
pub async fn run_ingestion(
    backend: &dyn GraphBackend,
    path: &str,
    force: bool,
    notifier: &dyn ProgressNotifier,
) -> IngestOutcome {
    let mut events = backend.process_documents(path, force).await;
    while let Some(event) = events.next().await {
        match event {
            ProgressEvent::Status(message) => notifier.info(&message).await,
            ProgressEvent::Failed => return IngestOutcome::Failed,
        }
    }
    IngestOutcome::Completed
}
