//! Language-model summarization of article text.
//!
//! A single configurable operation covers both of the app's call sites: the
//! quick digest of provider-supplied text and the deeper summary of a tidied
//! full article. The two differ only in input budget, prompt, and
//! temperature, captured as [`SummaryStyle`] presets.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::news::Story;
use crate::util::truncate_chars;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Shown when neither the model nor the story itself yields a summary.
pub const NO_SUMMARY: &str = "No summary available.";

#[derive(Debug, Error)]
pub enum SummarizeError {
    #[error("Request timed out after 20s")]
    Timeout,
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    #[error("Malformed completion response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Tuning knobs for one summarization call.
///
/// `max_input_chars` bounds token cost, not correctness; `instruction` is the
/// user-prompt preamble the input is appended to.
#[derive(Debug, Clone, Copy)]
pub struct SummaryStyle {
    pub max_input_chars: usize,
    pub max_tokens: u32,
    pub temperature: f32,
    pub system: Option<&'static str>,
    pub instruction: &'static str,
}

impl SummaryStyle {
    /// Quick digest of provider-supplied article text.
    pub const DIGEST: Self = Self {
        max_input_chars: 4000,
        max_tokens: 120,
        temperature: 0.4,
        system: Some("You are a helpful assistant who writes short news digests."),
        instruction: "Summarise the following article in ONE paragraph (4-5 sentences), \
                      clear and neutral, for a 12-year-old reader.",
    };

    /// Deeper summary of a tidied full-article body, used by the detail view.
    pub const ARTICLE: Self = Self {
        max_input_chars: 6000,
        max_tokens: 120,
        temperature: 0.7,
        system: None,
        instruction: "Summarise the following news article in ONE clear paragraph \
                      (max 80 words) so a 12-year-old can understand. Avoid jargon.",
    };
}

// ============================================================================
// Wire shapes
// ============================================================================

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

/// Lenient response shape: any missing level yields an empty summary rather
/// than a parse error.
#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Client for the language-model provider's chat-completion endpoint.
pub struct Summarizer {
    client: reqwest::Client,
    base_url: String,
    api_key: SecretString,
    model: String,
}

impl Summarizer {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: SecretString,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key,
            model: model.into(),
        }
    }

    /// Compresses `raw` into a short digest according to `style`.
    ///
    /// Raises on HTTP-level failure and on malformed response JSON. A
    /// well-formed response that lacks the expected content field returns an
    /// empty string, a valid if degenerate result.
    pub async fn summarise(
        &self,
        raw: &str,
        style: &SummaryStyle,
    ) -> Result<String, SummarizeError> {
        let chunk = truncate_chars(raw, style.max_input_chars);

        let mut messages = Vec::with_capacity(2);
        if let Some(system) = style.system {
            messages.push(ChatMessage {
                role: "system",
                content: system.to_string(),
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: format!("{}\n\n{}", style.instruction, chunk),
        });

        let body = ChatRequest {
            model: &self.model,
            messages,
            max_tokens: style.max_tokens,
            temperature: style.temperature,
        };

        let request = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&body);

        let response = tokio::time::timeout(REQUEST_TIMEOUT, request.send())
            .await
            .map_err(|_| SummarizeError::Timeout)?
            .map_err(SummarizeError::Network)?;

        if !response.status().is_success() {
            return Err(SummarizeError::HttpStatus(response.status().as_u16()));
        }

        let text = response.text().await.map_err(SummarizeError::Network)?;
        let parsed: ChatResponse = serde_json::from_str(&text)?;

        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .map(|c| c.trim().to_string())
            .unwrap_or_default())
    }

    /// Summarizes a tidied full article for the detail view.
    ///
    /// Never raises: any failure (network, HTTP, malformed response, or a
    /// response with no usable content) falls back to the story's own
    /// summary, or [`NO_SUMMARY`] when that is empty too.
    pub async fn summarise_article(&self, story: &Story, tidied: &str) -> String {
        match self.summarise(tidied, &SummaryStyle::ARTICLE).await {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => {
                tracing::debug!(story = %story.id, "Model returned no content, using story summary");
                fallback_summary(story)
            }
            Err(e) => {
                tracing::warn!(story = %story.id, error = %e, "Summarization failed, using story summary");
                fallback_summary(story)
            }
        }
    }
}

fn fallback_summary(story: &Story) -> String {
    if story.summary.is_empty() {
        NO_SUMMARY.to_string()
    } else {
        story.summary.clone()
    }
}
