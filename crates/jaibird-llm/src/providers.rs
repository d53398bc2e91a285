//! HTTP clients for the two supported providers.
//!
//! OpenAI uses the chat-completions format; Anthropic uses the messages
//! format with the system prompt as a top-level field. Both are single
//! non-streaming round-trips with no retry.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::{LLMConfig, ResolvedModel};
use crate::types::{CompletionRequest, LLMProvider, ModelFunction, UsageSnapshot, UsageStats};
use crate::TextModel;
use jaibird_core::{Error, Result};

const OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";
const ANTHROPIC_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// A configured model client. Provider is fixed at construction.
pub struct LlmClient {
    client: Client,
    provider: LLMProvider,
    model: String,
    api_key: String,
    usage: UsageStats,
}

impl LlmClient {
    pub fn new(resolved: ResolvedModel, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;
        Ok(Self {
            client,
            provider: resolved.provider,
            model: resolved.model,
            api_key: resolved.api_key,
            usage: UsageStats::default(),
        })
    }

    /// Build the client for `function`, or `None` when it is not configured.
    pub fn for_function(config: &LLMConfig, function: ModelFunction) -> Option<Self> {
        let resolved = config.resolve(function)?;
        match Self::new(resolved, Duration::from_secs(config.timeout_secs)) {
            Ok(client) => {
                debug!(
                    "{} uses {} model {}",
                    function, client.provider, client.model
                );
                Some(client)
            }
            Err(e) => {
                warn!("Could not build {} client: {}", function, e);
                None
            }
        }
    }

    pub fn provider(&self) -> LLMProvider {
        self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn send_openai(&self, request: &CompletionRequest) -> Result<String> {
        let body = openai_body(&self.model, request);
        let response = self
            .client
            .post(OPENAI_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Http(format!("Request failed: {}", e)))?;

        let parsed = read_json(response).await?;
        openai_text(&parsed)
    }

    async fn send_anthropic(&self, request: &CompletionRequest) -> Result<String> {
        let body = anthropic_body(&self.model, request);
        let response = self
            .client
            .post(ANTHROPIC_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Http(format!("Request failed: {}", e)))?;

        let parsed = read_json(response).await?;
        anthropic_text(&parsed)
    }
}

#[async_trait]
impl TextModel for LlmClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        self.usage.record_call();
        debug!(
            "Calling {} model {} (max_tokens={})",
            self.provider, self.model, request.max_tokens
        );
        let result = match self.provider {
            LLMProvider::OpenAI => self.send_openai(&request).await,
            LLMProvider::Anthropic => self.send_anthropic(&request).await,
        };
        if result.is_err() {
            self.usage.record_failure();
        }
        result
    }

    fn name(&self) -> String {
        format!("{}:{}", self.provider, self.model)
    }

    fn usage(&self) -> UsageSnapshot {
        self.usage.snapshot()
    }
}

async fn read_json(response: reqwest::Response) -> Result<Value> {
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(Error::Provider(format!("API error {}: {}", status, body)));
    }
    response
        .json::<Value>()
        .await
        .map_err(|e| Error::Provider(format!("Invalid response body: {}", e)))
}

fn openai_body(model: &str, request: &CompletionRequest) -> Value {
    let mut messages = Vec::new();
    if let Some(sys) = &request.system {
        messages.push(json!({"role": "system", "content": sys}));
    }
    messages.push(json!({"role": "user", "content": request.prompt}));

    json!({
        "model": model,
        "messages": messages,
        "temperature": request.temperature,
        "max_tokens": request.max_tokens,
    })
}

fn anthropic_body(model: &str, request: &CompletionRequest) -> Value {
    let mut body = json!({
        "model": model,
        "messages": [{"role": "user", "content": request.prompt}],
        "temperature": request.temperature,
        "max_tokens": request.max_tokens,
    });
    if let Some(sys) = &request.system {
        body["system"] = json!(sys);
    }
    body
}

fn openai_text(parsed: &Value) -> Result<String> {
    parsed["choices"][0]["message"]["content"]
        .as_str()
        .map(|s| s.trim().to_string())
        .ok_or_else(|| Error::Provider("Missing choices[0].message.content".into()))
}

fn anthropic_text(parsed: &Value) -> Result<String> {
    if parsed["type"].as_str() == Some("error") {
        let msg = parsed["error"]["message"]
            .as_str()
            .unwrap_or("Unknown error");
        return Err(Error::Provider(msg.to_string()));
    }
    parsed["content"][0]["text"]
        .as_str()
        .map(|s| s.trim().to_string())
        .ok_or_else(|| Error::Provider("Missing content[0].text".into()))
}
