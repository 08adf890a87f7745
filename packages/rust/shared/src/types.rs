//! Core domain types for contact discovery.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// BucketTag
// ---------------------------------------------------------------------------

/// Classification bucket a discovered profile is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BucketTag {
    Marketing,
    Leadership,
}

impl BucketTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Marketing => "MARKETING",
            Self::Leadership => "LEADERSHIP",
        }
    }
}

impl std::fmt::Display for BucketTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ProfileHit / Profile
// ---------------------------------------------------------------------------

/// A raw search result returned by a provider adapter, not yet classified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileHit {
    /// Canonical profile URL.
    pub url: String,
    /// Raw result label, conventionally `"Name - Role | Host"`.
    pub title: String,
    /// Free-text snippet surrounding the result.
    pub snippet: String,
    /// The query (or role keywords) that produced this hit.
    pub query: String,
}

/// A discovered individual profile filed under one bucket.
///
/// Identity is the URL. Only the link validator rewrites `url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub url: String,
    pub title: String,
    pub snippet: String,
    pub query: String,
    pub bucket: BucketTag,
}

impl Profile {
    /// Classify a provider hit into the given bucket.
    pub fn from_hit(hit: ProfileHit, bucket: BucketTag) -> Self {
        Self {
            url: hit.url,
            title: hit.title,
            snippet: hit.snippet,
            query: hit.query,
            bucket,
        }
    }

    /// Person's display name, derived from the search-result title.
    pub fn display_name(&self) -> String {
        display_name_from_title(&self.title)
    }

    /// Role text following the name in the title, if any.
    pub fn role(&self) -> Option<String> {
        split_title(&self.title)
            .get(1)
            .map(|s| s.to_string())
            .filter(|s| !s.is_empty())
    }
}

/// Separators used by search-result titles between name, role and site.
const TITLE_SEPARATORS: [&str; 4] = [" - ", " | ", " – ", " — "];

/// Split a search-result title on the common separators, trimming each part
/// and dropping empty ones.
pub fn split_title(title: &str) -> Vec<&str> {
    let mut parts = vec![title];
    for sep in TITLE_SEPARATORS {
        parts = parts.into_iter().flat_map(|p| p.split(sep)).collect();
    }
    parts
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

/// Take the person's name from a title like `"Jane Smith - CMO - Acme | LinkedIn"`.
pub fn display_name_from_title(title: &str) -> String {
    split_title(title)
        .first()
        .map(|s| s.to_string())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// ValidationOutcome
// ---------------------------------------------------------------------------

/// Per-URL verdict from the link validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", content = "url", rename_all = "snake_case")]
pub enum ValidationOutcome {
    /// Liveness probe answered 200.
    Valid,
    /// Link was broken and a replacement was found.
    Repaired(String),
    /// Link was dead and could not be repaired; the profile is dropped.
    Removed,
    /// Could not be verified (throttled, flagged without repair, network
    /// failure); kept as-is.
    KeptUnverified,
}

impl ValidationOutcome {
    /// Whether the profile survives validation.
    pub fn is_kept(&self) -> bool {
        !matches!(self, Self::Removed)
    }
}

// ---------------------------------------------------------------------------
// ContactLink
// ---------------------------------------------------------------------------

/// Display-name → canonical URL entry handed to the formatter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactLink {
    pub name: String,
    pub url: String,
}
