//! Profile link validation and repair.
//!
//! The profile host actively blocks lightweight existence checks, so every
//! verdict here is conservative: an unverifiable link is kept, and only a
//! confirmed-dead link that cannot be repaired is dropped.
//!
//! Per profile:
//! 1. URLs carrying mis-decoded percent sequences are repaired by name search
//!    without probing.
//! 2. Everything else gets a GET probe; only the status is read.

mod repair;

use std::time::Duration;

use reqwest::{Client, StatusCode};
use tracing::{debug, info, instrument, warn};
use url::Url;

use dealscout_shared::{
    DealScoutError, Profile, ProfileUrlPattern, Result, ValidationConfig, ValidationOutcome,
};

pub use repair::extract_profile_anchors;

/// User-Agent string for probe and search requests.
const USER_AGENT: &str = concat!("DealScout/", env!("CARGO_PKG_VERSION"));

/// Percent sequences produced when non-ASCII names are encoded twice or
/// decoded with the wrong charset.
const MALFORMED_SEQUENCES: [&str; 6] = [
    "%C3%83", "%C3%82", "%C3%A2%E2%82", "%EF%BF%BD", "%C2%80", "%C2%9D",
];

/// Non-standard status the profile host returns to suspected bots.
const STATUS_BOT_BLOCKED: u16 = 999;

// ---------------------------------------------------------------------------
// Structural check
// ---------------------------------------------------------------------------

/// Whether the URL contains a known mis-decoding artifact.
pub fn has_malformed_encoding(url: &str) -> bool {
    let upper = url.to_ascii_uppercase();
    MALFORMED_SEQUENCES.iter().any(|seq| upper.contains(seq))
}

// ---------------------------------------------------------------------------
// Probe classification
// ---------------------------------------------------------------------------

/// What a liveness probe told us.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeStatus {
    /// 200.
    Alive,
    /// 404.
    NotFound,
    /// Anti-automation throttling (999, 429): cannot tell dead from blocked.
    Throttled(u16),
    /// Any other status.
    Other(u16),
    /// Connect error, timeout, TLS failure.
    Unreachable,
}

impl ProbeStatus {
    pub fn from_status(status: StatusCode) -> Self {
        match status.as_u16() {
            200 => Self::Alive,
            404 => Self::NotFound,
            code @ (STATUS_BOT_BLOCKED | 429) => Self::Throttled(code),
            code => Self::Other(code),
        }
    }
}

// ---------------------------------------------------------------------------
// Validator
// ---------------------------------------------------------------------------

/// Probes profile links and repairs broken ones by name search.
pub struct LinkValidator {
    probe_client: Client,
    search_client: Client,
    search_endpoint: Url,
    pattern: ProfileUrlPattern,
}

impl LinkValidator {
    /// Create a validator from config.
    pub fn new(config: &ValidationConfig, pattern: ProfileUrlPattern) -> Result<Self> {
        let probe_client = build_client(Duration::from_secs(config.probe_timeout_secs))?;
        let search_client = build_client(Duration::from_secs(config.repair_timeout_secs))?;
        let search_endpoint = Url::parse(&config.repair_search_endpoint).map_err(|e| {
            DealScoutError::config(format!(
                "invalid repair search endpoint {:?}: {e}",
                config.repair_search_endpoint
            ))
        })?;

        Ok(Self {
            probe_client,
            search_client,
            search_endpoint,
            pattern,
        })
    }

    /// Decide what to do with one profile's link.
    ///
    /// Never fails: transport problems degrade to
    /// [`ValidationOutcome::KeptUnverified`].
    #[instrument(skip_all, fields(url = %profile.url))]
    pub async fn validate(&self, profile: &Profile, company: &str) -> ValidationOutcome {
        if has_malformed_encoding(&profile.url) {
            debug!("malformed percent-encoding, attempting repair");
            return match self.repair(profile, company).await {
                Some(url) => ValidationOutcome::Repaired(url),
                None => ValidationOutcome::KeptUnverified,
            };
        }

        match self.probe(&profile.url).await {
            ProbeStatus::Alive => ValidationOutcome::Valid,
            ProbeStatus::NotFound => match self.repair(profile, company).await {
                Some(url) => ValidationOutcome::Repaired(url),
                None => {
                    debug!("dead link with no repair, dropping");
                    ValidationOutcome::Removed
                }
            },
            status => {
                debug!(?status, "unverifiable, keeping");
                ValidationOutcome::KeptUnverified
            }
        }
    }

    /// GET the URL and classify the status; the body is never read.
    pub async fn probe(&self, url: &str) -> ProbeStatus {
        match self.probe_client.get(url).send().await {
            Ok(response) => ProbeStatus::from_status(response.status()),
            Err(e) => {
                debug!(%url, error = %e, "probe failed");
                ProbeStatus::Unreachable
            }
        }
    }

    /// Search for the person by name and company and return the first
    /// profile anchor that differs from the current link and is itself
    /// well-formed.
    pub async fn repair(&self, profile: &Profile, company: &str) -> Option<String> {
        let name = profile.display_name();
        if name.is_empty() {
            debug!("no name in title, cannot repair");
            return None;
        }

        let query = repair::repair_query(&name, company, self.pattern.host());
        let html = match self.search(&query).await {
            Ok(html) => html,
            Err(e) => {
                warn!(%name, error = %e, "repair search failed");
                return None;
            }
        };

        let repaired = extract_profile_anchors(&html, &self.search_endpoint, &self.pattern)
            .into_iter()
            .find(|candidate| candidate != &profile.url && !has_malformed_encoding(candidate));

        if let Some(url) = &repaired {
            info!(%name, old = %profile.url, new = %url, "profile link repaired");
        }
        repaired
    }

    async fn search(&self, query: &str) -> Result<String> {
        let response = self
            .search_client
            .get(self.search_endpoint.clone())
            .query(&[("q", query)])
            .send()
            .await
            .map_err(|e| DealScoutError::Network(format!("repair search: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DealScoutError::api(status.as_u16(), "repair search"));
        }

        response
            .text()
            .await
            .map_err(|e| DealScoutError::Network(format!("repair search body: {e}")))
    }
}

fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::limited(5))
        .timeout(timeout)
        .build()
        .map_err(|e| DealScoutError::Network(format!("failed to build HTTP client: {e}")))
}
