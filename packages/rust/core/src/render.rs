//! Plain-text contact blocks and the two-section layout.

use dealscout_providers::parse_profile_mentions;
use dealscout_shared::{ContactLink, Profile, ProfileUrlPattern, display_name_from_title};

pub const MARKETING_HEADER: &str = "=== MARKETING ===";
pub const SECTION_DIVIDER: &str = "=== LEADERSHIP ===";
pub const CHAMPION_MARKER: &str = "[CHAMPION]";

const UNKNOWN_ROLE: &str = "Verify on profile";
const MAX_INSIGHT_CHARS: usize = 240;

/// Lower is more senior.
pub fn seniority_rank(role: &str) -> u8 {
    let role = role.to_lowercase();
    let has_word = |w: &str| {
        role.split(|c: char| !c.is_alphanumeric())
            .any(|token| token == w)
    };

    if role.contains("chief")
        || ["ceo", "cfo", "coo", "cmo", "cro", "cto", "founder", "cofounder"]
            .iter()
            .any(|w| has_word(w))
        || role.contains("co-founder")
        || (role.contains("president") && !role.contains("vice president"))
    {
        0
    } else if has_word("vp")
        || has_word("svp")
        || has_word("evp")
        || role.contains("vice president")
        || role.contains("head of")
    {
        1
    } else if role.contains("director") {
        2
    } else {
        3
    }
}

/// Profiles ordered by seniority; ties keep their discovery order.
pub fn ranked(profiles: &[Profile]) -> Vec<&Profile> {
    let mut out: Vec<&Profile> = profiles.iter().collect();
    out.sort_by_key(|p| seniority_rank(&p.role().unwrap_or_else(|| p.title.clone())));
    out
}

/// Name to show for a profile, falling back to the URL slug.
pub fn contact_name(profile: &Profile) -> String {
    let name = profile.display_name();
    if name.is_empty() || name.contains("://") || name.contains("/in/") {
        return slug(&profile.url);
    }
    name
}

fn slug(url: &str) -> String {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(url)
        .to_string()
}

/// One contact block. Lines that would only repeat the title are omitted.
pub fn contact_block(profile: &Profile) -> String {
    let name = contact_name(profile);
    let role = profile.role().unwrap_or_else(|| UNKNOWN_ROLE.to_string());

    let mut lines = vec![
        name.clone(),
        format!("Title: {role}"),
        format!("LinkedIn: {}", profile.url),
    ];

    let insight = insight(&profile.snippet);
    if !insight.is_empty() && insight != profile.title && insight != name {
        lines.push(format!("Insight: {insight}"));
    }
    lines.join("\n")
}

fn insight(snippet: &str) -> String {
    let single = snippet.split_whitespace().collect::<Vec<_>>().join(" ");
    if single.chars().count() <= MAX_INSIGHT_CHARS {
        return single;
    }
    let cut: String = single.chars().take(MAX_INSIGHT_CHARS - 3).collect();
    format!("{}...", cut.trim_end())
}

/// Lay out both buckets and return the text with its name/URL mapping in
/// output order.
pub fn render_buckets(marketing: &[Profile], leadership: &[Profile]) -> (String, Vec<ContactLink>) {
    let mut sections = Vec::new();
    let mut links = Vec::new();

    for (header, profiles) in [(MARKETING_HEADER, marketing), (SECTION_DIVIDER, leadership)] {
        sections.push(header.to_string());
        for profile in ranked(profiles) {
            sections.push(contact_block(profile));
            links.push(ContactLink {
                name: contact_name(profile),
                url: profile.url.clone(),
            });
        }
    }

    (sections.join("\n\n"), links)
}

/// Recover the name/URL mapping from free text.
pub fn links_from_text(text: &str, pattern: &ProfileUrlPattern) -> Vec<ContactLink> {
    parse_profile_mentions(text, pattern, "")
        .into_iter()
        .map(|hit| {
            let name = display_name_from_title(&hit.title);
            ContactLink {
                name: if name.is_empty() { slug(&hit.url) } else { name },
                url: hit.url,
            }
        })
        .collect()
}

/// Whether a block is a section header that must survive deduplication.
pub fn is_header(block: &str) -> bool {
    let first = block.lines().next().unwrap_or("").trim();
    first == MARKETING_HEADER || first == SECTION_DIVIDER
}
