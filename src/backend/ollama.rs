//! Chat client for a locally hosted Ollama model.
//!
//! Talks to `POST {base_url}/api/chat` with `stream: false`. Requires no
//! credentials — a local backend never reads the hosted-API key.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::backend::ChatModel;
use crate::error::BackendError;

const DEFAULT_BASE_URL: &str = "http://localhost:11434";

pub struct OllamaChat {
    client: reqwest::Client,
    base_url: String,
    model: String,
    temperature: f64,
}

impl OllamaChat {
    pub fn new(
        base_url: Option<&str>,
        model: &str,
        temperature: f64,
        timeout_secs: u64,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            model: model.to_string(),
            temperature,
        })
    }
}

#[async_trait]
impl ChatModel for OllamaChat {
    fn describe(&self) -> String {
        format!("ollama:{} at {}", self.model, self.base_url)
    }

    async fn chat(
        &self,
        system: &str,
        user: &str,
        json_mode: bool,
    ) -> Result<String, BackendError> {
        let mut body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user },
            ],
            "stream": false,
            "options": { "temperature": self.temperature },
        });
        if json_mode {
            body["format"] = json!("json");
        }

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let payload: Value = response.json().await?;
        payload["message"]["content"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| {
                BackendError::Malformed("response has no message.content field".to_string())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_names_model_and_endpoint_only() {
        let chat = OllamaChat::new(Some("http://models.internal:11434/"), "llama3", 0.0, 30)
            .unwrap();
        assert_eq!(chat.describe(), "ollama:llama3 at http://models.internal:11434");
    }

    #[test]
    fn default_endpoint_is_local() {
        let chat = OllamaChat::new(None, "llama3", 0.0, 30).unwrap();
        assert!(chat.describe().contains("http://localhost:11434"));
    }
}
