//! # KGraph MCP
//!
//! **A knowledge-graph retrieval backend exposed as MCP tools over
//! streamable HTTP.**
//!
//! KGraph coordinates a retrieval backend — graph extraction, prompt-driven
//! parsing, querying, and streaming document ingestion — behind four
//! remotely invokable tools and two prompt resources. The concrete backend
//! (locally hosted model via Ollama, or a hosted OpenAI-compatible API) is
//! selected once at startup from environment configuration.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────────┐   ┌───────────────┐   ┌───────────────┐
//! │  Client  │──▶│ Streamable   │──▶│ Tool Surface  │──▶│ GraphBackend  │
//! │ Sessions │   │ HTTP (rmcp)  │   │ (registry)    │   │ ollama/openai │
//! └──────────┘   └──────────────┘   └──────┬────────┘   └───────┬───────┘
//!                                          │                    │
//!                                   progress notifications   model endpoint
//! ```
//!
//! ## Tools
//!
//! | Tool | Purpose |
//! |------|---------|
//! | `extract_graph_data` | Extract `{nodes, relationships}` from raw text |
//! | `parser` | Prompt-driven extraction with an optional override prompt |
//! | `query` | Answer a question against the knowledge graph |
//! | `ingestion` | Process a document file, streaming progress per step |
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | Environment-resolved configuration and backend kind |
//! | [`error`] | Backend fault taxonomy |
//! | [`models`] | `GraphComponents`, `Relationship`, `ProgressEvent` |
//! | [`prompts`] | The two pure prompt-template functions |
//! | [`progress`] | Progress notifier trait and stdout/JSON reporters |
//! | [`backend`] | `GraphBackend` trait, selector, retriever core, chat clients |
//! | [`ingest`] | Ingestion pipeline: forward statuses, stop on sentinel |
//! | [`tools`] | Tool trait, registry, and the four built-in tools |
//! | [`mcp`] | rmcp `ServerHandler` bridge (tools + prompts) |
//! | [`server`] | Axum router: `/mcp` mount, `/healthz`, CORS |

pub mod backend;
pub mod config;
pub mod error;
pub mod ingest;
pub mod mcp;
pub mod models;
pub mod progress;
pub mod prompts;
pub mod server;
pub mod tools;

pub use backend::{select_backend, GraphBackend};
pub use config::{BackendKind, Config};
pub use error::BackendError;
pub use models::{GraphComponents, ProgressEvent, Relationship};
pub use tools::{Tool, ToolContext, ToolRegistry};
