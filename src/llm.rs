//! OpenAI-compatible chat completions client.
//!
//! Backs both model-facing collaborators of the core pipeline: the
//! per-chunk [`SummarizerSession`] and the [`JsonRepairer`] used by JSON
//! recovery. Each call is a single attempt; failures are handled by the
//! caller (fallback text for summaries, the final recovery error for
//! repair).

use anyhow::{bail, Result};
use async_trait::async_trait;
use quizsmith_core::recover::JsonRepairer;
use quizsmith_core::summarize::{
    SummarizeOptions, SummarizerSession, SummaryFormat, SummaryKind, SummaryLength,
};
use serde_json::Value;
use std::time::Duration;

use crate::config::LlmConfig;

const REPAIR_INSTRUCTIONS: &str = "You fix malformed JSON. Reply with the corrected JSON only, \
    with no commentary and no code fences. Keep every field and value that can be kept.";

#[derive(Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl ChatClient {
    /// Build a client from `[llm]`.
    ///
    /// # Errors
    ///
    /// Fails when the provider is disabled or no model is configured.
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        if !config.is_enabled() {
            bail!("No LLM configured: set [llm] provider and model in the config file");
        }
        let model = config
            .model
            .clone()
            .ok_or_else(|| anyhow::anyhow!("llm.model required for provider '{}'", config.provider))?;
        let api_key = std::env::var(&config.api_key_env).ok();
        if api_key.is_none() {
            tracing::warn!(var = %config.api_key_env, "API key variable not set, sending unauthenticated requests");
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            model,
            api_key,
        })
    }

    /// One chat completion with a system and a user message.
    pub async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user }
            ],
        });

        let mut request = self.http.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            bail!("LLM API error {}: {}", status, body_text);
        }
        let json: Value = response.json().await?;
        parse_chat_response(&json)
    }
}

/// Extract `choices[0].message.content`.
pub fn parse_chat_response(json: &Value) -> Result<String> {
    let content = json
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow::anyhow!("Invalid chat response: missing choices[0].message.content"))?;
    if content.trim().is_empty() {
        bail!("Model returned an empty completion");
    }
    Ok(content.to_string())
}

/// System prompt describing the requested summary.
pub fn summary_instructions(options: &SummarizeOptions) -> String {
    let kind = match options.kind {
        SummaryKind::KeyPoints => "the key points of the text as a bulleted list",
        SummaryKind::Tldr => "a short overview of the text",
        SummaryKind::Teaser => "an intriguing teaser for the text",
        SummaryKind::Headline => "a single headline capturing the text",
    };
    let length = match options.length {
        SummaryLength::Short => "Be brief.",
        SummaryLength::Medium => "Use a moderate length.",
        SummaryLength::Long => "Be thorough.",
    };
    let format = match options.format {
        SummaryFormat::Markdown => "Format the answer as Markdown.",
        SummaryFormat::PlainText => "Answer in plain text without Markdown.",
    };
    let mut prompt = format!("Summarize {}. {} {}", kind, length, format);
    if let Some(context) = options.shared_context.as_deref().filter(|c| !c.trim().is_empty()) {
        prompt.push_str("\n\nContext: ");
        prompt.push_str(context.trim());
    }
    prompt
}

/// A summarization session over a [`ChatClient`].
pub struct ChatSummarizer {
    client: ChatClient,
    released: bool,
}

impl ChatSummarizer {
    pub fn new(client: ChatClient) -> Self {
        Self {
            client,
            released: false,
        }
    }
}

#[async_trait]
impl SummarizerSession for ChatSummarizer {
    async fn summarize(&mut self, text: &str, options: &SummarizeOptions) -> Result<String> {
        if self.released {
            bail!("summarizer session already released");
        }
        let summary = self
            .client
            .complete(&summary_instructions(options), text)
            .await?;
        Ok(summary.trim().to_string())
    }

    fn release(&mut self) {
        self.released = true;
        tracing::debug!(model = %self.client.model, "summarizer session released");
    }
}

/// Model-assisted JSON repair over a [`ChatClient`].
pub struct ChatRepairer {
    client: ChatClient,
}

impl ChatRepairer {
    pub fn new(client: ChatClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl JsonRepairer for ChatRepairer {
    async fn repair(&self, text: &str) -> Result<String> {
        self.client.complete(REPAIR_INSTRUCTIONS, text).await
    }
}
