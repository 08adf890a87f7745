//! Champion lookup and removal of the champion from the aggregate listing.

use std::sync::LazyLock;

use dealscout_providers::{GenerationRequest, TextGenerator, prompts, strip_markdown};
use dealscout_shared::ProfileUrlPattern;
use regex::Regex;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::render::{CHAMPION_MARKER, is_header};

/// Blank-line block separator (tolerates whitespace-only lines).
static BLOCK_SPLIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[ \t]*\n").expect("block split regex"));

/// The named target contact, surfaced ahead of everything else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Champion {
    pub name: String,
    /// Rendered block, always starting with [`CHAMPION_MARKER`].
    pub text: String,
    pub url: Option<String>,
}

impl Champion {
    /// Emitted when the lookup finds nothing.
    pub fn placeholder(name: &str) -> Self {
        Self {
            name: name.to_string(),
            text: format!(
                "{CHAMPION_MARKER} {name}\nTitle: Verify on profile\nLinkedIn: Search manually"
            ),
            url: None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.url.is_some()
    }

    pub fn block(&self) -> &str {
        &self.text
    }
}

/// Split text into blank-line delimited blocks, dropping empty ones.
pub fn split_blocks(text: &str) -> Vec<&str> {
    BLOCK_SPLIT_RE
        .split(text)
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .collect()
}

/// Look the champion up with one grounded request.
///
/// Returns `(text, url)`; both are `None` when the backend fails or the
/// answer holds no profile URL.
#[instrument(skip(generator, pattern))]
pub async fn resolve(
    generator: &dyn TextGenerator,
    pattern: &ProfileUrlPattern,
    name: &str,
    company: &str,
) -> (Option<String>, Option<String>) {
    let prompt = prompts::champion(name, company, pattern.host());
    let answer = match generator.generate(&GenerationRequest::grounded(prompt)).await {
        Ok(answer) => answer,
        Err(e) => {
            warn!(error = %e, "champion lookup failed");
            return (None, None);
        }
    };

    let cleaned = strip_markdown(&answer);
    let Some(url) = pattern.find_first(&cleaned) else {
        info!("no profile URL in champion answer");
        return (None, None);
    };

    let block = split_blocks(&cleaned)
        .into_iter()
        .find(|b| pattern.find_first(b).as_deref() == Some(url.as_str()))
        .unwrap_or(cleaned.trim());

    info!(%url, "champion resolved");
    (Some(mark(block)), Some(url))
}

/// Resolve and fall back to the placeholder.
pub async fn lookup(
    generator: &dyn TextGenerator,
    pattern: &ProfileUrlPattern,
    name: &str,
    company: &str,
) -> Champion {
    match resolve(generator, pattern, name, company).await {
        (Some(text), url @ Some(_)) => Champion {
            name: name.to_string(),
            text,
            url,
        },
        _ => Champion::placeholder(name),
    }
}

fn mark(block: &str) -> String {
    if block.starts_with(CHAMPION_MARKER) {
        block.to_string()
    } else {
        format!("{CHAMPION_MARKER} {block}")
    }
}

/// Case-insensitive substring match in either direction. Empty strings
/// never match.
pub fn names_match(candidate: &str, champion_name: &str) -> bool {
    let a = candidate.trim().to_lowercase();
    let b = champion_name.trim().to_lowercase();
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a.contains(&b) || b.contains(&a)
}

/// Remove every block that refers to the champion: by a profile URL equal to
/// the champion's or by a first line matching the name. Section headers are
/// kept.
pub fn deduplicate(
    text: &str,
    pattern: &ProfileUrlPattern,
    champion_url: Option<&str>,
    champion_name: &str,
) -> String {
    split_blocks(text)
        .into_iter()
        .filter(|block| {
            if is_header(block) {
                return true;
            }
            let by_url = champion_url.is_some_and(|url| {
                pattern.find_all(block).iter().any(|(_, found)| found == url)
            });
            let first = block.lines().next().unwrap_or("");
            !(by_url || names_match(first, champion_name))
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
