// Suggestion generator backed by the Anthropic Messages API

use super::SuggestionGenerator;
use crate::config::SuggestConfig;
use crate::error::GenerationError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const BODY_PREVIEW_LIMIT: usize = 512;

/// Asks a hosted model for a JSON array of task descriptions
pub struct AnthropicGenerator {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
    max_tokens: u32,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: String,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl AnthropicGenerator {
    /// Build a generator, reading the API key from the configured
    /// environment variable
    pub fn from_config(config: &SuggestConfig) -> Result<Self, GenerationError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| GenerationError::MissingApiKey(config.api_key_env.clone()))?;
        Self::with_api_key(config, api_key)
    }

    pub fn with_api_key(config: &SuggestConfig, api_key: impl Into<String>) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| GenerationError::Request(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key: api_key.into(),
            max_tokens: config.max_tokens,
        })
    }
}

#[async_trait]
impl SuggestionGenerator for AnthropicGenerator {
    async fn generate(&self, topic: &str) -> Result<Vec<String>, GenerationError> {
        if topic.trim().is_empty() {
            return Err(GenerationError::EmptyTopic);
        }

        let request = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            messages: vec![Message {
                role: "user",
                content: build_prompt(topic),
            }],
        };

        debug!(endpoint = %self.endpoint, model = %self.model, "Sending suggestion request");

        let resp = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(classify_reqwest)?;

        let status = resp.status();
        let body = resp.text().await.map_err(classify_reqwest)?;
        if !status.is_success() {
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body: preview_body(&body),
            });
        }

        let parsed: MessagesResponse = serde_json::from_str(&body)
            .map_err(|e| GenerationError::Decode(format!("{} | body={}", e, preview_body(&body))))?;

        let text: String = parsed
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("\n");

        let suggestions = parse_suggestions(&text)?;
        info!(topic, count = suggestions.len(), "Received suggestions");
        Ok(suggestions)
    }
}

fn build_prompt(topic: &str) -> String {
    format!(
        "Suggest tasks someone might add to their to-do list for this topic.\n\n\
         Topic: {}\n\n\
         Each task should be specific and actionable. \
         Reply with only a JSON array of strings.",
        topic.trim()
    )
}

/// Pull the first JSON array of strings out of a model reply
///
/// Tolerates prose or code fences around the array, including stray
/// brackets in the prose before it.
pub fn parse_suggestions(text: &str) -> Result<Vec<String>, GenerationError> {
    let mut last_error = None;

    for (start, _) in text.match_indices('[') {
        let mut stream = serde_json::Deserializer::from_str(&text[start..]).into_iter::<Vec<String>>();
        match stream.next() {
            Some(Ok(items)) => {
                return Ok(items
                    .into_iter()
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect());
            }
            Some(Err(e)) => last_error = Some(e.to_string()),
            None => {}
        }
    }

    Err(GenerationError::Decode(match last_error {
        Some(e) => e,
        None => format!("no JSON array in reply: {}", preview_body(text)),
    }))
}

fn classify_reqwest(err: reqwest::Error) -> GenerationError {
    if err.is_timeout() {
        GenerationError::Request(format!("timed out: {}", err))
    } else if err.is_connect() {
        GenerationError::Request(format!("connect failed: {}", err))
    } else if err.is_decode() || err.is_body() {
        GenerationError::Decode(err.to_string())
    } else {
        GenerationError::Request(err.to_string())
    }
}

fn preview_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty body>".to_string();
    }

    let mut out: String = trimmed.chars().take(BODY_PREVIEW_LIMIT).collect();
    if trimmed.chars().count() > BODY_PREVIEW_LIMIT {
        out.push_str("...");
    }
    out
}
