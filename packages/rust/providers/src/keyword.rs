//! Restricted-domain keyword search backend.
//!
//! Each query is sent on its own. Rows whose URL is not a personal profile are
//! dropped, and a failing query is logged and skipped so the rest of the
//! batch still runs.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use dealscout_shared::{
    DealScoutError, KeywordSearchConfig, ProfileHit, ProfileUrlPattern, Result,
    canonicalize_profile_url,
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::{ProfileSearch, USER_AGENT};

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    search_depth: &'a str,
    include_domains: [&'a str; 1],
    max_results: u32,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchRow>,
}

#[derive(Debug, Deserialize)]
struct SearchRow {
    #[serde(default)]
    url: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Keyword search client constrained to the profile host.
pub struct KeywordSearchClient {
    client: Client,
    endpoint: String,
    api_key: String,
    search_depth: String,
    max_results: u32,
    query_delay: Duration,
    pattern: ProfileUrlPattern,
}

impl KeywordSearchClient {
    /// Create a client from config and a resolved API key.
    pub fn new(
        config: &KeywordSearchConfig,
        api_key: impl Into<String>,
        pattern: ProfileUrlPattern,
    ) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DealScoutError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: api_key.into(),
            search_depth: config.search_depth.clone(),
            max_results: config.max_results,
            query_delay: config.query_delay(),
            pattern,
        })
    }

    /// Override the pause between queries.
    pub fn with_query_delay(mut self, delay: Duration) -> Self {
        self.query_delay = delay;
        self
    }

    /// Issue one query and return its raw rows.
    async fn run_query(&self, query: &str) -> Result<Vec<SearchRow>> {
        let body = SearchRequest {
            query,
            search_depth: &self.search_depth,
            include_domains: [self.pattern.host()],
            max_results: self.max_results,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| DealScoutError::Network(format!("keyword search: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(DealScoutError::api(status.as_u16(), message));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| DealScoutError::parse(format!("keyword search response: {e}")))?;

        Ok(parsed.results)
    }
}

#[async_trait]
impl ProfileSearch for KeywordSearchClient {
    fn name(&self) -> &str {
        "keyword"
    }

    #[instrument(skip_all, fields(provider = "keyword", queries = queries.len()))]
    async fn search(&self, queries: &[String]) -> Result<Vec<ProfileHit>> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut hits = Vec::new();

        for (i, query) in queries.iter().enumerate() {
            debug!(n = i + 1, total = queries.len(), %query, "keyword query");

            let result = self.run_query(query).await;
            // Pause after every query, the last and failed ones included.
            if !self.query_delay.is_zero() {
                tokio::time::sleep(self.query_delay).await;
            }

            let rows = match result {
                Ok(rows) => rows,
                Err(e) => {
                    warn!(%query, error = %e, "keyword query failed, skipping");
                    continue;
                }
            };

            for row in rows {
                if !self.pattern.is_profile_url(&row.url) {
                    continue;
                }
                let url = canonicalize_profile_url(&row.url);
                if seen.insert(url.clone()) {
                    hits.push(ProfileHit {
                        url,
                        title: row.title,
                        snippet: row.content,
                        query: query.clone(),
                    });
                }
            }
        }

        info!(profiles = hits.len(), "keyword search finished");
        Ok(hits)
    }
}
