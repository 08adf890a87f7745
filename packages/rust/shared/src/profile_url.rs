//! Profile URL grammar shared by every stage of the pipeline.
//!
//! A profile URL is `<scheme>://[sub.]<host>[:port]/in/<slug>`. Organization
//! pages (`/company/...`) and bare host links never match.

use regex::Regex;

use crate::error::{DealScoutError, Result};

/// Host used when no override is configured.
pub const DEFAULT_PROFILE_HOST: &str = "linkedin.com";

/// Compiled matcher for personal profile URLs on one host.
#[derive(Debug, Clone)]
pub struct ProfileUrlPattern {
    host: String,
    regex: Regex,
}

impl ProfileUrlPattern {
    /// Build a matcher for profile paths on `host` (subdomains and an
    /// explicit port are accepted).
    pub fn new(host: &str) -> Result<Self> {
        let host = host.trim().trim_end_matches('/');
        if host.is_empty() {
            return Err(DealScoutError::config("profile host must not be empty"));
        }
        let pattern = format!(
            r#"(?i)(?:https?://)?\b(?:[a-z0-9-]+\.)*{}(?::\d+)?/in/[^\s/?#<>"'()\[\]*,|]+/?"#,
            regex::escape(host)
        );
        let regex = Regex::new(&pattern)
            .map_err(|e| DealScoutError::config(format!("invalid profile host {host:?}: {e}")))?;
        Ok(Self {
            host: host.to_string(),
            regex,
        })
    }

    /// The host this pattern was built for.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Whether `url` is itself a profile URL (not merely containing one).
    pub fn is_profile_url(&self, url: &str) -> bool {
        self.regex
            .find(url.trim())
            .is_some_and(|m| m.start() == 0)
    }

    /// All profile URLs in `text`, canonicalized, with the byte offset of
    /// each match.
    pub fn find_all(&self, text: &str) -> Vec<(usize, String)> {
        self.regex
            .find_iter(text)
            .map(|m| (m.start(), canonicalize_profile_url(m.as_str())))
            .collect()
    }

    /// First profile URL in `text`, canonicalized.
    pub fn find_first(&self, text: &str) -> Option<String> {
        self.regex
            .find(text)
            .map(|m| canonicalize_profile_url(m.as_str()))
    }
}

impl Default for ProfileUrlPattern {
    fn default() -> Self {
        Self::new(DEFAULT_PROFILE_HOST).expect("default profile host compiles")
    }
}

/// Normalize a profile URL so that the same person always has the same key.
///
/// Adds `https://` when the scheme is missing, drops query string, fragment,
/// trailing slash and trailing punctuation. Percent sequences are left
/// untouched so malformed encodings stay detectable.
pub fn canonicalize_profile_url(raw: &str) -> String {
    let mut url = raw.trim();
    if let Some(idx) = url.find(['?', '#']) {
        url = &url[..idx];
    }
    let url = url.trim_end_matches(['/', '.', ',', ';', ':', ')', ']', '*']);

    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{url}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_personal_profiles_only() {
        let pattern = ProfileUrlPattern::default();
        assert!(pattern.is_profile_url("https://www.linkedin.com/in/janesmith"));
        assert!(pattern.is_profile_url("https://uk.linkedin.com/in/jane-smith-12ab/"));
        assert!(!pattern.is_profile_url("https://www.linkedin.com/company/acme"));
        assert!(!pattern.is_profile_url("https://www.notlinkedin.com/in/janesmith"));
        assert!(!pattern.is_profile_url("see https://www.linkedin.com/in/janesmith"));
    }

    #[test]
    fn finds_urls_in_free_text() {
        let pattern = ProfileUrlPattern::default();
        let text = "Jane (https://www.linkedin.com/in/janesmith?trk=x), \
                    and **linkedin.com/in/johndoe/**.";
        let found: Vec<String> = pattern.find_all(text).into_iter().map(|(_, u)| u).collect();
        assert_eq!(
            found,
            vec![
                "https://www.linkedin.com/in/janesmith".to_string(),
                "https://linkedin.com/in/johndoe".to_string(),
            ]
        );
    }

    #[test]
    fn custom_host_with_port() {
        let pattern = ProfileUrlPattern::new("127.0.0.1").unwrap();
        assert!(pattern.is_profile_url("http://127.0.0.1:8080/in/jane"));
        assert_eq!(
            pattern.find_first("LinkedIn: http://127.0.0.1:8080/in/jane").as_deref(),
            Some("http://127.0.0.1:8080/in/jane")
        );
    }

    #[test]
    fn canonicalization_keeps_percent_sequences() {
        assert_eq!(
            canonicalize_profile_url("https://www.linkedin.com/in/jos%C3%83%C2%A9/#about"),
            "https://www.linkedin.com/in/jos%C3%83%C2%A9"
        );
        assert_eq!(
            canonicalize_profile_url("www.linkedin.com/in/jane."),
            "https://www.linkedin.com/in/jane"
        );
    }

    #[test]
    fn empty_host_rejected() {
        assert!(ProfileUrlPattern::new("  ").is_err());
    }
}
