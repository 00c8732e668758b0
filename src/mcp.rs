//! MCP JSON-RPC protocol bridge.
//!
//! Adapts the [`ToolRegistry`] and the prompt templates into an MCP
//! Streamable HTTP endpoint that agent clients connect to over the standard
//! JSON-RPC protocol.
//!
//! * The four knowledge-graph **tools** are exposed via `list_tools` / `call_tool`.
//! * The two **prompt templates** are exposed via `list_prompts` / `get_prompt`.
//!
//! Progress emitted by a tool during execution is sent to the invoking
//! session as MCP logging notifications, in order, distinct from the tool's
//! final result.

use std::borrow::Cow;
use std::sync::Arc;

use async_trait::async_trait;
use rmcp::model::*;
use rmcp::service::{Peer, RequestContext};
use rmcp::{ErrorData as McpError, RoleServer, ServerHandler};

use crate::backend::GraphBackend;
use crate::progress::ProgressNotifier;
use crate::prompts;
use crate::tools::{Tool as KgraphTool, ToolContext, ToolRegistry};

/// Forwards progress lines to the invoking session as MCP logging
/// notifications. Delivery failures are ignored: a vanished session must not
/// fail the operation that was logging to it.
struct McpNotifier {
    peer: Peer<RoleServer>,
}

#[async_trait]
impl ProgressNotifier for McpNotifier {
    async fn info(&self, message: &str) {
        let _ = self
            .peer
            .notify_logging_message(LoggingMessageNotificationParam {
                level: LoggingLevel::Info,
                logger: Some("kgraph".to_string()),
                data: serde_json::Value::String(message.to_string()),
            })
            .await;
    }
}

/// Bridges the tool registry and prompt templates to the MCP protocol.
///
/// Each MCP session receives a clone of this struct (everything is behind
/// `Arc`), so all sessions share the same backend instance and tool set.
#[derive(Clone)]
pub struct KgraphMcp {
    backend: Arc<dyn GraphBackend>,
    tools: Arc<ToolRegistry>,
}

impl KgraphMcp {
    pub fn new(backend: Arc<dyn GraphBackend>) -> Self {
        Self {
            backend,
            tools: Arc::new(ToolRegistry::with_builtins()),
        }
    }

    /// Convert a registered tool into an rmcp `Tool` descriptor.
    fn to_mcp_tool(tool: &dyn KgraphTool) -> Tool {
        let input_schema: Arc<serde_json::Map<String, serde_json::Value>> =
            match tool.parameters_schema() {
                serde_json::Value::Object(map) => Arc::new(map),
                _ => Arc::new(serde_json::Map::new()),
            };

        Tool {
            name: Cow::Owned(tool.name().to_string()),
            title: Some(tool.title().to_string()),
            description: Some(Cow::Owned(tool.description().to_string())),
            input_schema,
            output_schema: None,
            annotations: None,
            execution: None,
            icons: None,
            meta: None,
        }
    }

    fn prompt_descriptors() -> Vec<Prompt> {
        vec![
            Prompt {
                name: "parser_text_prompt".to_string(),
                title: Some("Parser Text Prompt".to_string()),
                description: Some(
                    "Generate a prompt for extracting relationships from text.".to_string(),
                ),
                arguments: Some(vec![PromptArgument {
                    name: "text".to_string(),
                    title: None,
                    description: Some("Input text to extract relationships from".to_string()),
                    required: Some(false),
                }]),
                icons: None,
                meta: None,
            },
            Prompt {
                name: "agent_query_prompt".to_string(),
                title: Some("Agent Query Prompt".to_string()),
                description: Some(
                    "Generate a prompt for the agent to answer a user query using the knowledge graph."
                        .to_string(),
                ),
                arguments: Some(vec![
                    PromptArgument {
                        name: "nodes_str".to_string(),
                        title: None,
                        description: Some("String representation of graph nodes".to_string()),
                        required: Some(true),
                    },
                    PromptArgument {
                        name: "edges_str".to_string(),
                        title: None,
                        description: Some("String representation of graph edges".to_string()),
                        required: Some(true),
                    },
                    PromptArgument {
                        name: "user_query".to_string(),
                        title: None,
                        description: Some("The user's query to be answered".to_string()),
                        required: Some(true),
                    },
                ]),
                icons: None,
                meta: None,
            },
        ]
    }
}

fn required_arg<'a>(
    args: &'a serde_json::Map<String, serde_json::Value>,
    prompt: &str,
    name: &str,
) -> Result<&'a str, McpError> {
    args.get(name).and_then(|v| v.as_str()).ok_or_else(|| {
        McpError::new(
            ErrorCode::INVALID_PARAMS,
            format!("prompt '{}' requires a string argument '{}'", prompt, name),
            None,
        )
    })
}

impl ServerHandler for KgraphMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_prompts()
                .enable_logging()
                .build(),
            server_info: Implementation {
                name: "kgraph".to_string(),
                title: Some("KGraph".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                description: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "KGraph — knowledge-graph retrieval over MCP. Use extract_graph_data to \
                 turn raw text into nodes and relationships, parser for prompt-driven \
                 extraction, query to answer questions against the graph, and ingestion \
                 to process a document file with incremental progress. The two prompts \
                 expose the extraction and query templates for agent use."
                    .to_string(),
            ),
        }
    }

    // ── Tools ────────────────────────────────────────────────────────────

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        let tools: Vec<Tool> = self
            .tools
            .tools()
            .iter()
            .map(|t| Self::to_mcp_tool(t.as_ref()))
            .collect();
        std::future::ready(Ok(ListToolsResult::with_all_items(tools)))
    }

    fn get_tool(&self, name: &str) -> Option<Tool> {
        self.tools.find(name).map(Self::to_mcp_tool)
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let tool = self.tools.find(&request.name).ok_or_else(|| {
            McpError::new(
                ErrorCode::METHOD_NOT_FOUND,
                format!("no tool registered with name: {}", request.name),
                None,
            )
        })?;

        let params = request
            .arguments
            .map(serde_json::Value::Object)
            .unwrap_or(serde_json::Value::Object(serde_json::Map::new()));

        let notifier = Arc::new(McpNotifier {
            peer: context.peer.clone(),
        });
        let ctx = ToolContext::new(self.backend.clone(), notifier);
        match tool.execute(params, &ctx).await {
            Ok(result) => {
                let text = match result {
                    serde_json::Value::String(s) => s,
                    other => serde_json::to_string_pretty(&other).unwrap_or_default(),
                };
                Ok(CallToolResult::success(vec![Content::text(text)]))
            }
            Err(e) => {
                tracing::warn!(tool = %request.name, error = %e, "tool call failed");
                Ok(CallToolResult::error(vec![Content::text(e.to_string())]))
            }
        }
    }

    // ── Prompts ──────────────────────────────────────────────────────────

    fn list_prompts(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListPromptsResult, McpError>> + Send + '_ {
        std::future::ready(Ok(ListPromptsResult::with_all_items(
            Self::prompt_descriptors(),
        )))
    }

    async fn get_prompt(
        &self,
        request: GetPromptRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<GetPromptResult, McpError> {
        let args = request.arguments.unwrap_or_default();

        let (description, rendered) = match request.name.as_str() {
            "parser_text_prompt" => {
                let text = args.get("text").and_then(|v| v.as_str());
                (
                    "Prompt for extracting relationships from text.",
                    prompts::parser_prompt(text),
                )
            }
            "agent_query_prompt" => {
                let nodes_str = required_arg(&args, &request.name, "nodes_str")?;
                let edges_str = required_arg(&args, &request.name, "edges_str")?;
                let user_query = required_arg(&args, &request.name, "user_query")?;
                (
                    "Prompt for answering a user query from the knowledge graph.",
                    prompts::query_prompt(nodes_str, edges_str, user_query),
                )
            }
            other => {
                return Err(McpError::new(
                    ErrorCode::METHOD_NOT_FOUND,
                    format!("no prompt registered with name: {}", other),
                    None,
                ))
            }
        };

        Ok(GetPromptResult {
            description: Some(description.to_string()),
            messages: vec![PromptMessage::new_text(PromptMessageRole::User, rendered)],
        })
    }
}
