//! Integration tests for the tool surface and server wiring.
//!
//! A mock `GraphBackend` is injected through `ToolContext` (the same seam
//! the MCP bridge uses), proving the capability set works end to end
//! without a model endpoint: validation string results, progress ordering,
//! sentinel handling, and the liveness probe on a real listening server.

use async_trait::async_trait;
use futures::{stream, StreamExt};
use serde_json::{json, Value};
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use kgraph_mcp::backend::ProgressStream;
use kgraph_mcp::progress::ProgressNotifier;
use kgraph_mcp::server::build_router;
use kgraph_mcp::{
    BackendError, GraphBackend, GraphComponents, ProgressEvent, Relationship, Tool, ToolContext,
    ToolRegistry,
};

// ─── Mock backend ───────────────────────────────────────────────────

/// Reads the document it is given and replays a deterministic extraction,
/// counting how many progress items each consumer pulls.
struct FixtureBackend {
    pulled: Arc<AtomicUsize>,
}

impl FixtureBackend {
    fn new() -> Self {
        Self {
            pulled: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn graph() -> GraphComponents {
        GraphComponents {
            nodes: [
                ("alice".to_string(), "Alice".to_string()),
                ("acme".to_string(), "Acme Corp".to_string()),
            ]
            .into(),
            relationships: vec![Relationship::new("alice", "acme", "works_at")],
        }
    }
}

#[async_trait]
impl GraphBackend for FixtureBackend {
    async fn extract_graph_components(
        &self,
        _raw_text: &str,
    ) -> Result<GraphComponents, BackendError> {
        Ok(Self::graph())
    }

    async fn llm_parser(
        &self,
        prompt_text: &str,
        _prompt_user: Option<&str>,
    ) -> Result<GraphComponents, BackendError> {
        if prompt_text.trim().is_empty() {
            return Err(BackendError::Extraction(
                "prompt text is empty after trimming".to_string(),
            ));
        }
        Ok(Self::graph())
    }

    async fn query(&self, query_text: &str) -> Result<String, BackendError> {
        Ok(format!("Alice works at Acme Corp. (asked: {})", query_text))
    }

    async fn process_documents(&self, path: &str, _force: bool) -> ProgressStream {
        let content = std::fs::read_to_string(path);
        let events = match content {
            Ok(body) => vec![
                ProgressEvent::Status(format!("Processing document {}", path)),
                ProgressEvent::Status(format!("Extracted graph from {} bytes", body.len())),
                ProgressEvent::Status(format!("Stored document {}", path)),
            ],
            Err(e) => vec![
                ProgressEvent::Status(format!("failed to read {}: {}", path, e)),
                ProgressEvent::Failed,
                ProgressEvent::Status("never pulled".to_string()),
            ],
        };
        let pulled = self.pulled.clone();
        Box::pin(stream::iter(events).inspect(move |_| {
            pulled.fetch_add(1, Ordering::SeqCst);
        }))
    }
}

struct Collecting(Mutex<Vec<String>>);

#[async_trait]
impl ProgressNotifier for Collecting {
    async fn info(&self, message: &str) {
        self.0.lock().unwrap().push(message.to_string());
    }
}

fn tool_context() -> (Arc<FixtureBackend>, Arc<Collecting>, ToolContext) {
    let backend = Arc::new(FixtureBackend::new());
    let notifier = Arc::new(Collecting(Mutex::new(Vec::new())));
    let ctx = ToolContext::new(backend.clone(), notifier.clone());
    (backend, notifier, ctx)
}

async fn call(registry: &ToolRegistry, name: &str, params: Value, ctx: &ToolContext) -> Value {
    registry
        .find(name)
        .unwrap_or_else(|| panic!("tool {} not registered", name))
        .execute(params, ctx)
        .await
        .unwrap()
}

// ─── Capability set ─────────────────────────────────────────────────

#[tokio::test]
async fn registry_exposes_the_full_capability_set() {
    let registry = ToolRegistry::with_builtins();
    let names: Vec<&str> = registry.tools().iter().map(|t| t.name()).collect();
    assert_eq!(names, ["extract_graph_data", "parser", "query", "ingestion"]);

    for tool in registry.tools() {
        let schema = tool.parameters_schema();
        assert_eq!(schema["type"], "object", "tool {}", tool.name());
        assert!(schema["properties"].is_object(), "tool {}", tool.name());
    }
}

#[tokio::test]
async fn extract_and_parser_round_trip_through_the_backend() {
    let registry = ToolRegistry::with_builtins();
    let (_, _, ctx) = tool_context();

    let extracted = call(
        &registry,
        "extract_graph_data",
        json!({ "raw_data": "Alice works at Acme." }),
        &ctx,
    )
    .await;
    assert_eq!(extracted["nodes"]["alice"], "Alice");
    assert_eq!(extracted["relationships"][0]["relation"], "works_at");

    let parsed = call(
        &registry,
        "parser",
        json!({ "text": "Alice works at Acme.", "prompt_user": "extract people" }),
        &ctx,
    )
    .await;
    assert_eq!(parsed["nodes"]["acme"], "Acme Corp");
}

#[tokio::test]
async fn validation_failures_are_string_results_not_errors() {
    let registry = ToolRegistry::with_builtins();
    let (_, _, ctx) = tool_context();

    let cases = [
        ("parser", json!({ "text": [] }), "text must be a string."),
        ("parser", json!({ "text": "  " }), "text cannot be an empty string."),
        ("query", json!({ "query": 1 }), "query must be a string."),
        ("query", json!({ "query": "" }), "query cannot be an empty string."),
        ("ingestion", json!({ "path": false }), "path_file must be a string."),
        ("ingestion", json!({ "path": "" }), "path_file cannot be an empty string."),
    ];
    for (tool, params, expected) in cases {
        let result = call(&registry, tool, params, &ctx).await;
        assert_eq!(result, json!(expected), "tool {}", tool);
    }
}

#[tokio::test]
async fn ingestion_streams_progress_in_order_then_confirms() {
    let registry = ToolRegistry::with_builtins();
    let (_, notifier, ctx) = tool_context();

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "Alice works at Acme.").unwrap();
    let path = file.path().to_str().unwrap().to_string();

    let result = call(&registry, "ingestion", json!({ "path": path }), &ctx).await;
    assert_eq!(
        result,
        json!(format!("Document {} ingested successfully.", path))
    );

    let notes = notifier.0.lock().unwrap();
    assert_eq!(notes.len(), 3);
    assert_eq!(notes[0], format!("Processing document {}", path));
    assert_eq!(notes[2], format!("Stored document {}", path));
}

#[tokio::test]
async fn ingestion_missing_file_short_circuits_before_the_pipeline() {
    let registry = ToolRegistry::with_builtins();
    let (backend, notifier, ctx) = tool_context();

    let result = call(
        &registry,
        "ingestion",
        json!({ "path": "/no/such/file" }),
        &ctx,
    )
    .await;
    assert_eq!(result, json!("File /no/such/file does not exist."));
    assert_eq!(backend.pulled.load(Ordering::SeqCst), 0);
    assert!(notifier.0.lock().unwrap().is_empty());
}

#[tokio::test]
async fn ingestion_sentinel_stops_the_stream_early() {
    // A directory path passes the existence check but fails to read, which
    // makes the fixture backend emit one status and then the sentinel.
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().to_str().unwrap().to_string();

    let registry = ToolRegistry::with_builtins();
    let (backend, notifier, ctx) = tool_context();

    let result = call(&registry, "ingestion", json!({ "path": path }), &ctx).await;
    assert_eq!(result, json!(format!("Error processing document {}.", path)));
    assert!(backend.pulled.load(Ordering::SeqCst) <= 2);
    assert_eq!(notifier.0.lock().unwrap().len(), 1);
}

// ─── Server wiring ──────────────────────────────────────────────────

#[tokio::test]
async fn healthz_answers_ok_on_a_real_listener() {
    let backend: Arc<dyn GraphBackend> = Arc::new(FixtureBackend::new());
    let app = build_router(backend);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let response = reqwest::get(format!("http://{}/healthz", addr))
        .await
        .unwrap();
    assert!(response.status().is_success());
    assert_eq!(response.text().await.unwrap(), "ok");
}
