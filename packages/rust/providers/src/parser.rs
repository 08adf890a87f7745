//! Free-text profile extraction for generative search responses.
//!
//! Grammar:
//! - A mention is any profile URL matched by [`ProfileUrlPattern`].
//! - Its context window is the match line plus up to two lines before and one
//!   line after, never crossing a blank line or another mention.
//! - The name is the first unlabeled window line before the match (falling
//!   back to the match line with the URL cut out); a `Title:` line supplies
//!   the role.

use std::collections::HashSet;
use std::sync::LazyLock;

use dealscout_shared::{ProfileHit, ProfileUrlPattern};
use regex::Regex;

/// Lines of context kept above a mention.
const CONTEXT_BEFORE: usize = 2;

/// Lines of context kept below a mention.
const CONTEXT_AFTER: usize = 1;

// ---------------------------------------------------------------------------
// Regex patterns (compiled once)
// ---------------------------------------------------------------------------

/// Leading heading, bullet, numbered-list or quote marker.
static LINE_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:#{1,6}\s+|[-*+•]\s+|\d{1,3}[.)]\s+|>\s*)").expect("line marker regex")
});

/// `[text](target)` links.
static MD_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[([^\]]*)\]\(([^)\s]*)\)").expect("markdown link regex")
});

/// `Label: value` lines (`Title:`, `Location:`, `LinkedIn Profile:` ...).
static LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z][A-Za-z ()/]{0,30}):\s*(.*)$").expect("label regex")
});

/// Whitespace-delimited words.
static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\S+").expect("token regex"));

// ---------------------------------------------------------------------------
// Markdown stripping
// ---------------------------------------------------------------------------

/// Strip markdown decoration from a single line: list/heading/quote markers,
/// emphasis markers, inline code ticks, and `[text](url)` links.
pub fn strip_markdown_line(line: &str) -> String {
    let line = LINE_MARKER_RE.replace(line, "");
    let line = MD_LINK_RE.replace_all(&line, |caps: &regex::Captures<'_>| {
        let text = caps[1].trim();
        let target = caps[2].trim();
        if target.is_empty() {
            text.to_string()
        } else if text.is_empty() || text == target {
            target.to_string()
        } else {
            format!("{text} {target}")
        }
    });
    let line = TOKEN_RE.replace_all(&line, |caps: &regex::Captures<'_>| strip_emphasis(&caps[0]));
    line.trim().to_string()
}

/// Emphasis markers are removed from words but only trimmed from the ends of
/// links, whose paths may legitimately contain `__`.
fn strip_emphasis(token: &str) -> String {
    if token.contains("://") || token.contains("/in/") {
        token.trim_matches(['*', '`']).to_string()
    } else {
        token.replace("**", "").replace("__", "").replace(['*', '`'], "")
    }
}

/// Strip markdown decoration line by line, preserving line structure.
pub fn strip_markdown(text: &str) -> String {
    text.lines()
        .map(strip_markdown_line)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

// ---------------------------------------------------------------------------
// Mention extraction
// ---------------------------------------------------------------------------

/// Extract every distinct profile mention from free text.
///
/// `query` is recorded on each hit as its originating query.
pub fn parse_profile_mentions(
    text: &str,
    pattern: &ProfileUrlPattern,
    query: &str,
) -> Vec<ProfileHit> {
    let lines: Vec<String> = text.lines().map(strip_markdown_line).collect();
    let mut seen: HashSet<String> = HashSet::new();
    let mut hits = Vec::new();

    for (idx, line) in lines.iter().enumerate() {
        for (_, url) in pattern.find_all(line) {
            if !seen.insert(url.clone()) {
                continue;
            }

            let before = context_before(&lines, idx, pattern);
            let after = context_after(&lines, idx, pattern);

            let title = build_title(before, line, after, pattern);
            let snippet = before
                .iter()
                .chain(std::iter::once(line))
                .chain(after.iter())
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join("\n");

            hits.push(ProfileHit {
                url,
                title,
                snippet,
                query: query.to_string(),
            });
        }
    }

    hits
}

/// Up to [`CONTEXT_BEFORE`] lines above `idx`, stopping at a blank line or a
/// line holding another mention.
fn context_before<'a>(lines: &'a [String], idx: usize, pattern: &ProfileUrlPattern) -> &'a [String] {
    let mut start = idx;
    while start > 0 && idx - start < CONTEXT_BEFORE {
        let prev = &lines[start - 1];
        if prev.is_empty() || pattern.find_first(prev).is_some() {
            break;
        }
        start -= 1;
    }
    &lines[start..idx]
}

/// Up to [`CONTEXT_AFTER`] lines below `idx`, same stopping rules.
fn context_after<'a>(lines: &'a [String], idx: usize, pattern: &ProfileUrlPattern) -> &'a [String] {
    let mut end = idx + 1;
    while end < lines.len() && end - idx - 1 < CONTEXT_AFTER {
        let next = &lines[end];
        if next.is_empty() || pattern.find_first(next).is_some() {
            break;
        }
        end += 1;
    }
    &lines[idx + 1..end]
}

fn build_title(
    before: &[String],
    line: &str,
    after: &[String],
    pattern: &ProfileUrlPattern,
) -> String {
    let role = before
        .iter()
        .chain(after.iter())
        .map(String::as_str)
        .chain(std::iter::once(line))
        .find_map(|l| {
            LABEL_RE
                .captures(l)
                .filter(|c| c[1].trim().eq_ignore_ascii_case("title"))
                .map(|c| c[2].trim().to_string())
        })
        .filter(|r| !r.is_empty());

    let name = before
        .iter()
        .find(|l| !LABEL_RE.is_match(l))
        .map(|l| l.trim().to_string())
        .unwrap_or_else(|| name_from_match_line(line, pattern));

    match role {
        Some(role) if !name.is_empty() => format!("{name} - {role}"),
        Some(role) => role,
        None => name,
    }
}

/// Cut the URL (and any `Label:` prefix) out of the match line and keep the
/// leading text, e.g. `"Jane Smith, CMO - https://..."` → `"Jane Smith, CMO"`.
fn name_from_match_line(line: &str, pattern: &ProfileUrlPattern) -> String {
    let head = match pattern.find_all(line).first() {
        Some((start, _)) => &line[..*start],
        None => line,
    };
    let head = match LABEL_RE.captures(head) {
        Some(caps) => caps.get(2).map_or("", |m| m.as_str()),
        None => head,
    };
    head.trim()
        .trim_end_matches(['-', ':', '|', ',', '(', '–', '—'])
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAIN_FIXTURE: &str = "\
Here are the contacts I found:

Jane Smith
Title: Chief Marketing Officer at Acme Corp
LinkedIn: https://www.linkedin.com/in/janesmith
Location: Boston, MA

John Doe
Title: VP of Demand Generation at Acme Corp
LinkedIn: https://www.linkedin.com/in/johndoe/
Insight: Built demand gen team from scratch
";

    const MARKDOWN_FIXTURE: &str = "\
1. **[Priya Patel](https://www.linkedin.com/in/priyapatel)** - Director, Growth Marketing
2. **Marco Rossi**, Head of Brand - linkedin.com/in/marco-rossi-7b2
* Company page: https://www.linkedin.com/company/acme (ignored)
3. Priya again: https://www.linkedin.com/in/priyapatel?trk=dup
";

    #[test]
    fn parses_plain_contact_blocks() {
        let pattern = ProfileUrlPattern::default();
        let hits = parse_profile_mentions(PLAIN_FIXTURE, &pattern, "CMO, VP Marketing");

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].url, "https://www.linkedin.com/in/janesmith");
        assert_eq!(hits[0].title, "Jane Smith - Chief Marketing Officer at Acme Corp");
        assert!(hits[0].snippet.contains("Location: Boston, MA"));
        assert_eq!(hits[0].query, "CMO, VP Marketing");

        assert_eq!(hits[1].url, "https://www.linkedin.com/in/johndoe");
        assert_eq!(hits[1].title, "John Doe - VP of Demand Generation at Acme Corp");
        assert!(!hits[1].snippet.contains("Jane"));
    }

    #[test]
    fn parses_inline_markdown_mentions() {
        let pattern = ProfileUrlPattern::default();
        let hits = parse_profile_mentions(MARKDOWN_FIXTURE, &pattern, "q");

        let urls: Vec<&str> = hits.iter().map(|h| h.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://www.linkedin.com/in/priyapatel",
                "https://linkedin.com/in/marco-rossi-7b2",
            ]
        );
        assert_eq!(hits[0].title, "Priya Patel");
        assert_eq!(hits[1].title, "Marco Rossi, Head of Brand");
    }

    #[test]
    fn no_mentions_is_empty_not_error() {
        let pattern = ProfileUrlPattern::default();
        let hits = parse_profile_mentions("I could not find anyone.", &pattern, "q");
        assert!(hits.is_empty());
    }

    #[test]
    fn strip_markdown_removes_decoration() {
        let text = "## **Jane Smith**\n* Title: *CMO*\n- LinkedIn: [https://www.linkedin.com/in/janesmith](https://www.linkedin.com/in/janesmith)\n> `note`";
        assert_eq!(
            strip_markdown(text),
            "Jane Smith\nTitle: CMO\nLinkedIn: https://www.linkedin.com/in/janesmith\nnote"
        );
    }

    #[test]
    fn strip_markdown_keeps_url_underscores() {
        assert_eq!(
            strip_markdown_line("https://www.linkedin.com/in/jane_smith_1"),
            "https://www.linkedin.com/in/jane_smith_1"
        );
    }

    #[test]
    fn emphasis_around_link_keeps_double_underscores() {
        assert_eq!(
            strip_markdown_line("**Jane** **https://www.linkedin.com/in/jane__smith**"),
            "Jane https://www.linkedin.com/in/jane__smith"
        );

        let hits = parse_profile_mentions(
            "__Jane Smith__ - linkedin.com/in/jane__smith",
            &ProfileUrlPattern::default(),
            "q",
        );
        assert_eq!(hits[0].url, "https://linkedin.com/in/jane__smith");
        assert_eq!(hits[0].title, "Jane Smith");
    }
}
