//! Environment-resolved configuration.
//!
//! All settings are read once at process start and are immutable thereafter.
//! Exactly one backend kind is active per process; an unrecognized
//! `LLM_MODEL_TYPE` fails here, before any tool is registered, so a
//! misconfigured deployment never serves partial functionality.
//!
//! [`Config::from_env`] reads the process environment; tests use
//! [`Config::from_lookup`] with a closure so they never touch (or race on)
//! real environment variables.

use anyhow::{bail, Context, Result};
use std::fmt;
use std::path::PathBuf;

/// The closed set of supported backend kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Locally hosted model served by Ollama.
    Ollama,
    /// Hosted OpenAI-compatible API.
    OpenAi,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Ollama => write!(f, "ollama"),
            BackendKind::OpenAi => write!(f, "openai"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Which backend implementation to construct at startup.
    pub backend: BackendKind,
    pub llm: LlmConfig,
    pub embedding: EmbeddingConfig,
    pub neo4j: Neo4jConfig,
    pub qdrant: QdrantConfig,
    pub redis: RedisConfig,
    pub aws: AwsConfig,
    /// Root directory for ingestion state (dedup manifest lives here).
    pub path_download: PathBuf,
    /// Collection/namespace name for the vector store.
    #[allow(dead_code)]
    pub collection_name: String,
    /// Bind address for the MCP server.
    pub bind: String,
}

/// Chat-model settings. `api_key` is only required (and only read) by the
/// hosted-API backend; the local backend never sees it.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub model: String,
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub temperature: f64,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Default)]
pub struct EmbeddingConfig {
    #[allow(dead_code)]
    pub model: Option<String>,
    #[allow(dead_code)]
    pub url: Option<String>,
}

/// Graph store endpoint. Consumed by the graph-database collaborator, held
/// here only so the surface matches the deployment environment.
#[derive(Debug, Clone, Default)]
pub struct Neo4jConfig {
    #[allow(dead_code)]
    pub url: Option<String>,
    #[allow(dead_code)]
    pub username: Option<String>,
    #[allow(dead_code)]
    pub password: Option<String>,
    #[allow(dead_code)]
    pub database: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct QdrantConfig {
    #[allow(dead_code)]
    pub url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RedisConfig {
    #[allow(dead_code)]
    pub host: Option<String>,
    #[allow(dead_code)]
    pub port: u16,
    #[allow(dead_code)]
    pub db: u32,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: 6379,
            db: 0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AwsConfig {
    #[allow(dead_code)]
    pub access_key_id: Option<String>,
    #[allow(dead_code)]
    pub secret_access_key: Option<String>,
    #[allow(dead_code)]
    pub bucket: Option<String>,
    #[allow(dead_code)]
    pub region: Option<String>,
}

fn default_bind() -> String {
    "127.0.0.1:8765".to_string()
}

impl Config {
    /// Resolve configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve configuration through an arbitrary key lookup.
    ///
    /// Empty values are treated as unset, matching how container platforms
    /// pass through blank environment entries.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| -> Option<String> {
            lookup(key).filter(|v| !v.trim().is_empty())
        };

        let kind_raw = get("LLM_MODEL_TYPE")
            .context("LLM_MODEL_TYPE must be set (ollama or openai)")?;
        let backend = match kind_raw.as_str() {
            "ollama" => BackendKind::Ollama,
            "openai" => BackendKind::OpenAi,
            other => bail!("Unsupported LLM_MODEL_TYPE: {:?} (expected ollama or openai)", other),
        };

        let model = get("LLM_MODEL_NAME").context("LLM_MODEL_NAME must be set")?;

        let temperature = match get("TEMPERATURE") {
            Some(raw) => raw
                .parse::<f64>()
                .with_context(|| format!("TEMPERATURE is not a number: {:?}", raw))?,
            None => 0.0,
        };
        let timeout_secs = match get("LLM_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .with_context(|| format!("LLM_TIMEOUT_SECS is not an integer: {:?}", raw))?,
            None => 120,
        };

        let redis_port = match get("REDIS_PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .with_context(|| format!("REDIS_PORT is not a port number: {:?}", raw))?,
            None => 6379,
        };
        let redis_db = match get("REDIS_DB") {
            Some(raw) => raw
                .parse::<u32>()
                .with_context(|| format!("REDIS_DB is not an integer: {:?}", raw))?,
            None => 0,
        };

        Ok(Config {
            backend,
            llm: LlmConfig {
                model,
                url: get("LLM_URL"),
                api_key: get("API_KEY"),
                temperature,
                timeout_secs,
            },
            embedding: EmbeddingConfig {
                model: get("MODEL_EMBEDDING"),
                url: get("LLM_EMBEDDING_URL"),
            },
            neo4j: Neo4jConfig {
                url: get("NEO4J_URL"),
                username: get("NEO4J_USERNAME"),
                password: get("NEO4J_PASSWORD"),
                database: get("NEO4J_DB_NAME"),
            },
            qdrant: QdrantConfig {
                url: get("QDRANT_URL"),
            },
            redis: RedisConfig {
                host: get("REDIS_HOST"),
                port: redis_port,
                db: redis_db,
            },
            aws: AwsConfig {
                access_key_id: get("AWS_ACCESS_KEY_ID"),
                secret_access_key: get("AWS_SECRET_ACCESS_KEY"),
                bucket: get("AWS_BUCKET_NAME"),
                region: get("AWS_REGION"),
            },
            path_download: get("PATH_DOWNLOAD")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./data")),
            collection_name: get("COLLECTION_NAME").unwrap_or_else(|| "kgraph".to_string()),
            bind: get("KGRAPH_BIND").unwrap_or_else(default_bind),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn ollama_config_without_credentials() {
        let config = Config::from_lookup(lookup_from(&[
            ("LLM_MODEL_TYPE", "ollama"),
            ("LLM_MODEL_NAME", "llama3"),
        ]))
        .unwrap();
        assert_eq!(config.backend, BackendKind::Ollama);
        assert_eq!(config.llm.model, "llama3");
        assert!(config.llm.api_key.is_none());
        assert_eq!(config.bind, "127.0.0.1:8765");
    }

    #[test]
    fn unsupported_backend_kind_fails_at_parse() {
        let err = Config::from_lookup(lookup_from(&[
            ("LLM_MODEL_TYPE", "unknown"),
            ("LLM_MODEL_NAME", "m"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("Unsupported LLM_MODEL_TYPE"));
    }

    #[test]
    fn missing_backend_kind_fails() {
        let err = Config::from_lookup(lookup_from(&[("LLM_MODEL_NAME", "m")])).unwrap_err();
        assert!(err.to_string().contains("LLM_MODEL_TYPE"));
    }

    #[test]
    fn blank_values_count_as_unset() {
        let err = Config::from_lookup(lookup_from(&[
            ("LLM_MODEL_TYPE", "  "),
            ("LLM_MODEL_NAME", "m"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("LLM_MODEL_TYPE"));
    }

    #[test]
    fn numeric_settings_are_validated() {
        let err = Config::from_lookup(lookup_from(&[
            ("LLM_MODEL_TYPE", "openai"),
            ("LLM_MODEL_NAME", "gpt-4o-mini"),
            ("TEMPERATURE", "warm"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("TEMPERATURE"));
    }
}
