//! Generative backend with optional web-search grounding.
//!
//! Every call is followed by a cooldown because this backend's rate limits are
//! tighter than the keyword index's.

use std::time::Duration;

use async_trait::async_trait;
use dealscout_shared::{DealScoutError, GroundedSearchConfig, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::{GenerationRequest, TextGenerator, USER_AGENT};

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: [Content<'a>; 1],
    generation_config: GenerationConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<[Tool; 1]>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: [RequestPart<'a>; 1],
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct Tool {
    google_search: GoogleSearch,
}

#[derive(Debug, Serialize)]
struct GoogleSearch {}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Join the text of every part of the first candidate. Grounded answers
    /// are often split across several parts.
    fn into_text(self) -> String {
        self.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// `generateContent` client.
pub struct GeminiClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
    max_output_tokens: u32,
    temperature: f32,
    cooldown: Duration,
}

impl GeminiClient {
    /// Create a client from config and a resolved API key.
    pub fn new(config: &GroundedSearchConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DealScoutError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: api_key.into(),
            max_output_tokens: config.max_output_tokens,
            temperature: config.temperature,
            cooldown: config.cooldown(),
        })
    }

    /// Override the post-call cooldown.
    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    async fn call(&self, request: &GenerationRequest) -> Result<String> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let body = GenerateContentRequest {
            contents: [Content {
                parts: [RequestPart {
                    text: &request.prompt,
                }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: request.max_output_tokens.unwrap_or(self.max_output_tokens),
                temperature: request.temperature.unwrap_or(self.temperature),
            },
            tools: request.grounded.then(|| [Tool {
                google_search: GoogleSearch {},
            }]),
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| DealScoutError::Network(format!("generate request: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(DealScoutError::api(status.as_u16(), message));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| DealScoutError::parse(format!("generate response: {e}")))?;

        Ok(parsed.into_text())
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    fn name(&self) -> &str {
        &self.model
    }

    #[instrument(skip_all, fields(model = %self.model, grounded = request.grounded))]
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let result = self.call(request).await;

        if !self.cooldown.is_zero() {
            tokio::time::sleep(self.cooldown).await;
        }

        if let Ok(text) = &result {
            debug!(chars = text.len(), "generation finished");
        }
        result
    }
}
