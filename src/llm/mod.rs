//! OpenAI-compatible severity-model collaborator
//!
//! Speaks the chat-completions wire shape; any transport error, quota
//! error, or malformed response is returned as an error and absorbed by
//! the severity strategy's heuristic fallback upstream.

use crate::config::LlmConfig;
use crate::risk::{ChangeSummary, ModelVerdict, SeverityModel};
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const SYSTEM_PROMPT: &str = "You estimate the severity of a source-code change. \
Respond with strict JSON: {\"severity\": <number in [0,1]>, \"rationale\": <string>}. \
No other text.";

pub struct OpenAiSeverityModel {
    endpoint: String,
    model: String,
    api_key: String,
    client: reqwest::blocking::Client,
}

impl OpenAiSeverityModel {
    /// Build the client, or `None` when the configured key variable is unset
    pub fn from_config(config: &LlmConfig, timeout: Duration) -> Result<Option<Self>> {
        let Ok(api_key) = std::env::var(&config.api_key_env) else {
            log::debug!("{} not set, severity model disabled", config.api_key_env);
            return Ok(None);
        };
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .context("building HTTP client")?;
        Ok(Some(Self {
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key,
            client,
        }))
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f64,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

impl SeverityModel for OpenAiSeverityModel {
    fn assess(&self, summary: &ChangeSummary) -> Result<ModelVerdict> {
        let request = ChatRequest {
            model: &self.model,
            temperature: 0.1,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: serde_json::to_string(summary)?,
                },
            ],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .context("sending severity request")?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("severity endpoint returned {status}"));
        }

        let body: ChatResponse = response.json().context("decoding severity response")?;
        let content = body
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| anyhow!("severity response has no choices"))?;

        let verdict: ModelVerdict =
            serde_json::from_str(content.trim()).context("parsing severity verdict")?;
        Ok(verdict)
    }
}
