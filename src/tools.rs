//! Tool surface / capability registry.
//!
//! The four remotely invokable operations — `extract_graph_data`, `parser`,
//! `query`, `ingestion` — implemented against the [`Tool`] trait and
//! collected in a [`ToolRegistry`]. The MCP bridge ([`crate::mcp`]) dispatches
//! into this registry; tests inject a mock backend through [`ToolContext`].
//!
//! # Error contract
//!
//! Caller-input validation failures are *string results*, not errors: the
//! returned value describes the problem and the backend is never invoked.
//! Backend failures propagate as `Err` and are mapped to MCP tool error
//! results by the bridge — a tool invocation never crashes the session.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::backend::GraphBackend;
use crate::ingest::{run_ingestion, IngestOutcome};
use crate::progress::ProgressNotifier;

/// A named, remotely invokable operation with a fixed input/output schema.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool identifier, lowercase with underscores.
    fn name(&self) -> &str;

    /// Human-readable title for tool listings.
    fn title(&self) -> &str;

    /// One-line description for agent discovery.
    fn description(&self) -> &str;

    /// JSON Schema for the tool's parameters (`type: "object"`).
    fn parameters_schema(&self) -> Value;

    /// Execute with the raw JSON parameters object.
    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value>;
}

/// Per-invocation bridge handed to every tool: the shared backend instance
/// plus the session's progress notifier.
pub struct ToolContext {
    backend: Arc<dyn GraphBackend>,
    notifier: Arc<dyn ProgressNotifier>,
}

impl ToolContext {
    pub fn new(backend: Arc<dyn GraphBackend>, notifier: Arc<dyn ProgressNotifier>) -> Self {
        Self { backend, notifier }
    }

    pub fn backend(&self) -> &dyn GraphBackend {
        self.backend.as_ref()
    }

    /// Emit an informational progress notification to the invoking session,
    /// distinct from the operation's final return value.
    pub async fn info(&self, message: &str) {
        tracing::info!(target: "kgraph::tools", "{}", message);
        self.notifier.info(message).await;
    }
}

/// Registry of invokable tools.
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Registry pre-loaded with the four built-in knowledge-graph tools.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(ExtractGraphDataTool));
        registry.register(Box::new(ParserTool));
        registry.register(Box::new(QueryTool));
        registry.register(Box::new(IngestionTool));
        registry
    }

    pub fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.push(tool);
    }

    pub fn tools(&self) -> &[Box<dyn Tool>] {
        &self.tools
    }

    pub fn find(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .map(|t| t.as_ref())
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ============ extract_graph_data ============

/// Extract graph data from a document.
///
/// Non-string `raw_data` returns an empty graph instead of failing — a
/// deliberate permissive no-op preserved from the contract this tool has
/// always had, unlike its siblings which report a string error.
pub struct ExtractGraphDataTool;

#[async_trait]
impl Tool for ExtractGraphDataTool {
    fn name(&self) -> &str {
        "extract_graph_data"
    }

    fn title(&self) -> &str {
        "Extract Graph Data"
    }

    fn description(&self) -> &str {
        "Extract graph data from a document using the KGraph system."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "raw_data": { "type": "string", "description": "Raw text to extract a graph from" }
            },
            "required": ["raw_data"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let Some(raw_data) = params.get("raw_data").and_then(Value::as_str) else {
            return Ok(json!({ "nodes": {}, "relationships": [] }));
        };

        let components = ctx.backend().extract_graph_components(raw_data).await?;
        let result = json!({
            "nodes": components.nodes,
            "relationships": components.relationships,
        });
        ctx.info(&format!("Extracted Graph Data: {}", result)).await;
        Ok(result)
    }
}

// ============ parser ============

/// Parse a document into graph components.
pub struct ParserTool;

#[async_trait]
impl Tool for ParserTool {
    fn name(&self) -> &str {
        "parser"
    }

    fn title(&self) -> &str {
        "KGrag Parser"
    }

    fn description(&self) -> &str {
        "Parse a document using the KGraph system."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "text": { "type": "string", "description": "Text to be parsed" },
                "prompt_user": { "type": "string", "description": "Optional override prompt for the extractor" }
            },
            "required": ["text"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let Some(text) = params.get("text").and_then(Value::as_str) else {
            return Ok(Value::String("text must be a string.".to_string()));
        };
        if text.trim().is_empty() {
            return Ok(Value::String("text cannot be an empty string.".to_string()));
        }
        let prompt_user = params.get("prompt_user").and_then(Value::as_str);

        let components = ctx.backend().llm_parser(text, prompt_user).await?;
        let result = serde_json::to_value(&components)?;
        ctx.info(&format!("Parsed Relationships: {}", result)).await;
        Ok(result)
    }
}

// ============ query ============

/// Query the knowledge graph.
pub struct QueryTool;

#[async_trait]
impl Tool for QueryTool {
    fn name(&self) -> &str {
        "query"
    }

    fn title(&self) -> &str {
        "Query KGraph"
    }

    fn description(&self) -> &str {
        "Query the KGraph system with a specific query string."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "Question to answer against the knowledge graph" }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let Some(query) = params.get("query").and_then(Value::as_str) else {
            return Ok(Value::String("query must be a string.".to_string()));
        };
        if query.trim().is_empty() {
            return Ok(Value::String(
                "query cannot be an empty string.".to_string(),
            ));
        }

        ctx.info(&format!("Querying KGraph: {}", query)).await;
        let answer = ctx.backend().query(query).await?;
        Ok(Value::String(answer))
    }
}

// ============ ingestion ============

/// Ingest a file into the knowledge graph, streaming progress to the caller.
pub struct IngestionTool;

#[async_trait]
impl Tool for IngestionTool {
    fn name(&self) -> &str {
        "ingestion"
    }

    fn title(&self) -> &str {
        "Ingest"
    }

    fn description(&self) -> &str {
        "Ingest a path of file into the KGraph system."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": { "type": "string", "description": "Path to the document file to be ingested" }
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let Some(path) = params.get("path").and_then(Value::as_str) else {
            return Ok(Value::String("path_file must be a string.".to_string()));
        };
        if path.trim().is_empty() {
            return Ok(Value::String(
                "path_file cannot be an empty string.".to_string(),
            ));
        }
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Ok(Value::String(format!("File {} does not exist.", path)));
        }

        // Dedup is the backend's business; the tool surface always forces.
        let outcome = run_ingestion(ctx.backend(), path, true, &*ctx.notifier).await;
        match outcome {
            IngestOutcome::Completed => Ok(Value::String(format!(
                "Document {} ingested successfully.",
                path
            ))),
            IngestOutcome::Failed => Ok(Value::String(format!(
                "Error processing document {}.",
                path
            ))),
        }
    }
}
