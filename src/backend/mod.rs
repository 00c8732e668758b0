//! Retrieval backends.
//!
//! [`GraphBackend`] is the contract every backend satisfies; the tool
//! surface only ever talks to `Arc<dyn GraphBackend>`. [`select_backend`]
//! constructs exactly one implementation at startup from configuration and
//! fails fast on anything unsupported.
//!
//! Both concrete backends share one retriever core, [`GraphRetriever`],
//! generic over a [`ChatModel`] seam: [`ollama::OllamaChat`] for a locally
//! hosted model, [`openai::OpenAiChat`] for a hosted OpenAI-compatible API.
//! The retriever owns the in-memory graph snapshot and the on-disk dedup
//! manifest; graph/vector/cache stores proper are external collaborators.

pub mod ollama;
pub mod openai;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::channel::mpsc;
use futures::stream::BoxStream;
use futures::SinkExt;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::{BackendKind, Config};
use crate::error::BackendError;
use crate::models::{GraphComponents, ProgressEvent};
use crate::prompts;

/// Lazy, finite progress sequence for one document. Dropping the stream
/// stops the producer promptly; work already issued to the model endpoint
/// is not retroactively cancelled.
pub type ProgressStream = BoxStream<'static, ProgressEvent>;

/// Contract every retrieval backend implements.
///
/// Implementations are shared read-mostly across sessions and must be safely
/// callable concurrently; any internal serialization (e.g. one in-flight
/// model call per connection) is the implementation's own business.
#[async_trait]
pub trait GraphBackend: Send + Sync {
    /// Extract nodes and relationships from raw text.
    async fn extract_graph_components(
        &self,
        raw_text: &str,
    ) -> Result<GraphComponents, BackendError>;

    /// Parse free text into graph components, optionally with a caller
    /// supplied instruction prompt overriding the built-in one.
    ///
    /// Blank-after-trim input is rejected before any model call.
    async fn llm_parser(
        &self,
        prompt_text: &str,
        prompt_user: Option<&str>,
    ) -> Result<GraphComponents, BackendError>;

    /// Answer a question against the knowledge graph.
    ///
    /// When no graph context is available the answer falls back to general
    /// reasoning, and says so — never silently.
    async fn query(&self, query_text: &str) -> Result<String, BackendError>;

    /// Process one document, yielding progress events lazily.
    ///
    /// `force=true` bypasses the dedup shortcut and reprocesses
    /// unconditionally; `force=false` short-circuits files whose content
    /// hash is already recorded. The stream ends by exhaustion (success) or
    /// by yielding exactly one [`ProgressEvent::Failed`], after which
    /// nothing else is produced.
    async fn process_documents(&self, path: &str, force: bool) -> ProgressStream;
}

/// Chat-completion seam the retriever core is generic over.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// One-line description for startup logging (never includes credentials).
    fn describe(&self) -> String;

    /// Run one chat completion. `json_mode` asks the endpoint for a strict
    /// JSON object response where the API supports it.
    async fn chat(
        &self,
        system: &str,
        user: &str,
        json_mode: bool,
    ) -> Result<String, BackendError>;
}

/// Construct the configured backend. Called once at startup, before the
/// tool surface is mounted, so a misconfigured deployment never serves.
pub fn select_backend(config: &Config) -> Result<Arc<dyn GraphBackend>> {
    let state = Arc::new(GraphState::new(&config.path_download));
    let backend: Arc<dyn GraphBackend> = match config.backend {
        BackendKind::Ollama => {
            let chat = ollama::OllamaChat::new(
                config.llm.url.as_deref(),
                &config.llm.model,
                config.llm.temperature,
                config.llm.timeout_secs,
            )?;
            Arc::new(GraphRetriever::new(chat, state))
        }
        BackendKind::OpenAi => {
            let api_key = config
                .llm
                .api_key
                .clone()
                .context("API_KEY must be set for the openai backend")?;
            let chat = openai::OpenAiChat::new(
                config.llm.url.as_deref(),
                &config.llm.model,
                api_key,
                config.llm.temperature,
                config.llm.timeout_secs,
            )?;
            Arc::new(GraphRetriever::new(chat, state))
        }
    };
    Ok(backend)
}

// ============ Model output parsing ============

/// Parse a model response into [`GraphComponents`].
///
/// Tolerates a Markdown code fence around the JSON object, since chat models
/// add one even when told not to.
pub fn parse_graph_components(raw: &str) -> Result<GraphComponents, BackendError> {
    let body = strip_code_fence(raw.trim());
    serde_json::from_str::<GraphComponents>(body).map_err(|e| {
        let snippet: String = body.chars().take(200).collect();
        BackendError::Malformed(format!("{} (output started with: {:?})", e, snippet))
    })
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Skip an optional language tag on the fence line.
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

// ============ Ingestion state ============

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ManifestEntry {
    path: String,
    ingested_at: DateTime<Utc>,
}

/// Process-lifetime retrieval state: the merged graph snapshot queries run
/// against, and the content-hash manifest backing `force=false` dedup.
pub struct GraphState {
    graph: RwLock<GraphComponents>,
    manifest_path: PathBuf,
    manifest: RwLock<BTreeMap<String, ManifestEntry>>,
}

impl GraphState {
    /// Load state rooted at `state_dir`. A missing or unreadable manifest
    /// starts empty; it is rewritten on the next successful ingestion.
    pub fn new(state_dir: &Path) -> Self {
        let manifest_path = state_dir.join("kgraph_manifest.json");
        let manifest = std::fs::read_to_string(&manifest_path)
            .ok()
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default();
        Self {
            graph: RwLock::new(GraphComponents::default()),
            manifest_path,
            manifest: RwLock::new(manifest),
        }
    }

    async fn already_ingested(&self, hash: &str) -> bool {
        self.manifest.read().await.contains_key(hash)
    }

    async fn record(&self, path: &str, hash: &str) -> std::io::Result<()> {
        let serialized = {
            let mut manifest = self.manifest.write().await;
            manifest.insert(
                hash.to_string(),
                ManifestEntry {
                    path: path.to_string(),
                    ingested_at: Utc::now(),
                },
            );
            serde_json::to_string_pretty(&*manifest).unwrap_or_default()
        };
        if let Some(parent) = self.manifest_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.manifest_path, serialized).await
    }

    async fn merge(&self, components: GraphComponents) {
        self.graph.write().await.merge(components);
    }

    async fn snapshot(&self) -> GraphComponents {
        self.graph.read().await.clone()
    }
}

// ============ Retriever core ============

/// Shared backend core, generic over the chat model.
///
/// `GraphRetriever<OllamaChat>` and `GraphRetriever<OpenAiChat>` are the two
/// concrete backends this crate ships.
pub struct GraphRetriever<M: ChatModel> {
    chat: Arc<M>,
    state: Arc<GraphState>,
}

impl<M: ChatModel + 'static> GraphRetriever<M> {
    pub fn new(chat: M, state: Arc<GraphState>) -> Self {
        tracing::info!(model = %chat.describe(), "backend ready");
        Self {
            chat: Arc::new(chat),
            state,
        }
    }
}

/// Run one extraction round trip: parser prompt → chat → parse.
async fn extract_with<M: ChatModel>(
    chat: &M,
    raw_text: &str,
) -> Result<GraphComponents, BackendError> {
    let system = prompts::parser_prompt(None);
    let content = chat.chat(&system, raw_text, true).await?;
    parse_graph_components(&content)
}

#[async_trait]
impl<M: ChatModel + 'static> GraphBackend for GraphRetriever<M> {
    async fn extract_graph_components(
        &self,
        raw_text: &str,
    ) -> Result<GraphComponents, BackendError> {
        extract_with(self.chat.as_ref(), raw_text)
            .await
            .map_err(|e| BackendError::Extraction(e.to_string()))
    }

    async fn llm_parser(
        &self,
        prompt_text: &str,
        prompt_user: Option<&str>,
    ) -> Result<GraphComponents, BackendError> {
        let text = prompt_text.trim();
        if text.is_empty() {
            return Err(BackendError::Extraction(
                "prompt text is empty after trimming".to_string(),
            ));
        }
        let system = match prompt_user.map(str::trim).filter(|p| !p.is_empty()) {
            Some(custom) => custom.to_string(),
            None => prompts::parser_prompt(None),
        };
        let content = self.chat.chat(&system, text, true).await?;
        parse_graph_components(&content)
    }

    async fn query(&self, query_text: &str) -> Result<String, BackendError> {
        let graph = self.state.snapshot().await;
        let (system, user) = if graph.is_empty() {
            tracing::info!("no graph context available; answering from general reasoning");
            (
                "You are a helpful assistant. No knowledge-graph context is \
                 available for this question; answer from general reasoning \
                 and state explicitly that no graph context was used."
                    .to_string(),
                query_text.to_string(),
            )
        } else {
            (
                prompts::query_prompt(&graph.nodes_str(), &graph.edges_str(), query_text),
                query_text.to_string(),
            )
        };
        self.chat
            .chat(&system, &user, false)
            .await
            .map_err(|e| BackendError::Query(e.to_string()))
    }

    async fn process_documents(&self, path: &str, force: bool) -> ProgressStream {
        let chat = self.chat.clone();
        let state = self.state.clone();
        let path = path.to_string();
        let (mut tx, rx) = mpsc::channel::<ProgressEvent>(16);

        tokio::spawn(async move {
            // Sends fail only when the consumer is gone; stop immediately
            // so no further backend work runs for a dead session.
            macro_rules! emit {
                ($ev:expr) => {
                    if tx.send($ev).await.is_err() {
                        return;
                    }
                };
            }

            emit!(ProgressEvent::Status(format!("Processing document {}", path)));

            let raw = match tokio::fs::read_to_string(&path).await {
                Ok(raw) => raw,
                Err(e) => {
                    emit!(ProgressEvent::Status(format!(
                        "failed to read {}: {}",
                        path, e
                    )));
                    let _ = tx.send(ProgressEvent::Failed).await;
                    return;
                }
            };

            let digest = content_hash(&raw);
            if !force && state.already_ingested(&digest).await {
                emit!(ProgressEvent::Status(format!(
                    "Document {} already ingested, skipping (force reprocesses)",
                    path
                )));
                return;
            }

            emit!(ProgressEvent::Status("Extracting graph components".to_string()));
            let components = match extract_with(chat.as_ref(), &raw).await {
                Ok(components) => components,
                Err(e) => {
                    emit!(ProgressEvent::Status(format!(
                        "extraction failed for {}: {}",
                        path, e
                    )));
                    let _ = tx.send(ProgressEvent::Failed).await;
                    return;
                }
            };
            emit!(ProgressEvent::Status(format!(
                "Extracted {} nodes and {} relationships",
                components.nodes.len(),
                components.relationships.len()
            )));

            state.merge(components).await;
            if let Err(e) = state.record(&path, &digest).await {
                emit!(ProgressEvent::Status(format!(
                    "failed to record ingestion state for {}: {}",
                    path, e
                )));
                let _ = tx.send(ProgressEvent::Failed).await;
                return;
            }
            let _ = tx
                .send(ProgressEvent::Status(format!("Stored document {}", path)))
                .await;
        });

        Box::pin(rx)
    }
}
