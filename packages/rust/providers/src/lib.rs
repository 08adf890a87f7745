//! Search provider adapters for contact discovery.
//!
//! Two heterogeneous backends feed the pipeline:
//! - [`KeywordSearchClient`]: a restricted-domain keyword search index,
//!   queried once per query string.
//! - [`GeminiClient`]: a generative backend with optional web grounding,
//!   wrapped by [`GroundedSearch`] which batches role keywords into a single
//!   prompt and parses profile mentions out of the free-text answer.
//!
//! Both expose [`ProfileSearch`]; zero hits is a valid, non-error outcome.

mod gemini;
mod grounded;
mod keyword;
mod parser;
pub mod prompts;

use async_trait::async_trait;
use dealscout_shared::{ProfileHit, Result};

pub use gemini::GeminiClient;
pub use grounded::GroundedSearch;
pub use keyword::KeywordSearchClient;
pub use parser::{parse_profile_mentions, strip_markdown, strip_markdown_line};

/// User-Agent string for provider requests.
pub(crate) const USER_AGENT: &str = concat!("DealScout/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// A backend that turns a batch of queries into profile hits.
///
/// Returned hits are unique by URL and keep discovery order.
#[async_trait]
pub trait ProfileSearch: Send + Sync {
    /// Human-readable provider name for tracing.
    fn name(&self) -> &str;

    /// Run the batch. Adapters skip failing units internally where the
    /// backend allows it; an `Err` means the whole batch produced nothing.
    async fn search(&self, queries: &[String]) -> Result<Vec<ProfileHit>>;
}

/// A single generative request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// Free-text prompt.
    pub prompt: String,
    /// Output token cap; backend default when `None`.
    pub max_output_tokens: Option<u32>,
    /// Sampling temperature; backend default when `None`.
    pub temperature: Option<f32>,
    /// Enable live web-search grounding.
    pub grounded: bool,
}

impl GenerationRequest {
    /// A web-grounded request with backend defaults.
    pub fn grounded(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            max_output_tokens: None,
            temperature: None,
            grounded: true,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_output_tokens(mut self, tokens: u32) -> Self {
        self.max_output_tokens = Some(tokens);
        self
    }
}

/// A generative text backend.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Human-readable backend name for tracing.
    fn name(&self) -> &str;

    /// Generate text for the request. An empty string is a valid answer.
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;
}
