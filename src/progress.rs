//! Ingestion progress reporting.
//!
//! The ingestion pipeline forwards backend status lines through a
//! [`ProgressNotifier`]. Over MCP the notifier sends per-session logging
//! notifications (see [`crate::mcp`]); the standalone `kgraph ingest`
//! command prints to stdout (human) or emits one JSON object per line.

use async_trait::async_trait;
use std::io::Write;

/// Receives ordered, incremental status lines from a long-running operation.
///
/// Implementations must not reorder or batch: callers render the lines as
/// they arrive.
#[async_trait]
pub trait ProgressNotifier: Send + Sync {
    /// Emit one informational status line.
    async fn info(&self, message: &str);
}

/// Human-friendly progress on stdout, one line per event.
pub struct StdoutProgress;

#[async_trait]
impl ProgressNotifier for StdoutProgress {
    async fn info(&self, message: &str) {
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "{}", message);
        let _ = out.flush();
    }
}

/// Machine-readable progress: one JSON object per line on stdout.
pub struct JsonProgress;

#[async_trait]
impl ProgressNotifier for JsonProgress {
    async fn info(&self, message: &str) {
        let obj = serde_json::json!({ "event": "progress", "message": message });
        if let Ok(line) = serde_json::to_string(&obj) {
            let mut out = std::io::stdout().lock();
            let _ = writeln!(out, "{}", line);
            let _ = out.flush();
        }
    }
}

/// No-op notifier when progress output is disabled.
pub struct NoProgress;

#[async_trait]
impl ProgressNotifier for NoProgress {
    async fn info(&self, _message: &str) {}
}

/// Progress mode for the standalone ingestion entry point.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Build a notifier for this mode.
    pub fn notifier(&self) -> Box<dyn ProgressNotifier> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StdoutProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}
