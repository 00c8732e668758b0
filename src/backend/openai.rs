//! Chat client for a hosted OpenAI-compatible API.
//!
//! Talks to `POST {base_url}/v1/chat/completions` with a bearer credential.
//! `json_mode` maps to `response_format: {"type": "json_object"}`.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::backend::ChatModel;
use crate::error::BackendError;

const DEFAULT_BASE_URL: &str = "https://api.openai.com";

pub struct OpenAiChat {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
    temperature: f64,
}

impl OpenAiChat {
    pub fn new(
        base_url: Option<&str>,
        model: &str,
        api_key: String,
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
            api_key,
            temperature,
        })
    }
}

#[async_trait]
impl ChatModel for OpenAiChat {
    fn describe(&self) -> String {
        format!("openai:{} at {}", self.model, self.base_url)
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
            "temperature": self.temperature,
        });
        if json_mode {
            body["response_format"] = json!({ "type": "json_object" });
        }

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
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
        payload["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| {
                BackendError::Malformed(
                    "response has no choices[0].message.content field".to_string(),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_never_leaks_the_api_key() {
        let chat = OpenAiChat::new(None, "gpt-4o-mini", "sk-secret".to_string(), 0.0, 30)
            .unwrap();
        let described = chat.describe();
        assert!(described.contains("gpt-4o-mini"));
        assert!(!described.contains("sk-secret"));
    }
}
