//! Name-based link repair: search the web for `"<name>" "<company>"` and pick
//! the first result anchor that points at a profile.

use scraper::{Html, Selector};
use url::Url;

use dealscout_shared::{ProfileUrlPattern, canonicalize_profile_url};

/// Query parameter used by HTML search result pages to wrap outbound links.
const REDIRECT_PARAM: &str = "uddg";

/// Build the repair search query for a person.
pub(crate) fn repair_query(name: &str, company: &str, host: &str) -> String {
    format!("\"{name}\" \"{company}\" {host}")
}

/// Extract profile URLs from search result markup, in document order.
///
/// Anchors are resolved against `base`; redirect wrappers carrying the real
/// target in a `uddg` parameter are unwrapped.
pub fn extract_profile_anchors(html: &str, base: &Url, pattern: &ProfileUrlPattern) -> Vec<String> {
    let doc = Html::parse_document(html);
    let Ok(anchor_sel) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let mut found: Vec<String> = Vec::new();
    for el in doc.select(&anchor_sel) {
        let Some(href) = el.value().attr("href") else {
            continue;
        };
        let Some(target) = anchor_target(href, base) else {
            continue;
        };
        if pattern.is_profile_url(&target) {
            let url = canonicalize_profile_url(&target);
            if !found.contains(&url) {
                found.push(url);
            }
        }
    }
    found
}

/// Resolve an anchor href to its final destination.
fn anchor_target(href: &str, base: &Url) -> Option<String> {
    if href.starts_with('#') || href.starts_with("javascript:") || href.starts_with("mailto:") {
        return None;
    }

    let resolved = base.join(href).ok()?;
    let unwrapped = resolved
        .query_pairs()
        .find(|(k, _)| k == REDIRECT_PARAM)
        .map(|(_, v)| v.into_owned());

    Some(unwrapped.unwrap_or_else(|| resolved.to_string()))
}
