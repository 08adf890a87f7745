//! Prompt templates for the grounded backend.
//!
//! All prompts ask for plain text in the contact block format the parser and
//! the downstream formatter expect:
//!
//! ```text
//! Jane Smith
//! Title: Chief Marketing Officer at Acme Corp
//! LinkedIn: https://www.linkedin.com/in/janesmith
//! ```

/// Contact block format shared by every prompt.
const CONTACT_FORMAT: &str = "\
Use this EXACT plain text format for each contact, with a blank line between contacts:

CONTACT NAME
Title: [Their current title]
LinkedIn: [Full profile URL]
Tenure: [Time at company if known, otherwise \"Verify on profile\"]
Location: [City, State/Country if known, otherwise \"Verify on profile\"]
Insight: [Brief note about their background]

Do NOT use any markdown syntax (no **, no *, no #, no [], no ()).";

/// One batched sweep for several role keywords at a company.
pub fn role_sweep(company: &str, roles: &[String], host: &str) -> String {
    let role_list = roles
        .iter()
        .map(|r| format!("- {r}"))
        .collect::<Vec<_>>()
        .join("\n");
    let searches = roles
        .iter()
        .map(|r| format!("site:{host}/in \"{company}\" \"{r}\""))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "# ROLE
Act as an Executive Sales Researcher.

# TASK
Search {host} to find individuals who CURRENTLY work at {company} and hold any of these titles:
{role_list}

# SEARCH QUERIES TO EXECUTE
{searches}

# REQUIREMENTS
1. You MUST include the actual {host} profile URL (containing /in/) for each person
2. If you cannot find a person's URL, omit that person
3. Only include people who currently work at {company}

# FORMAT
{CONTACT_FORMAT}

Now search and list the contacts at {company}:"
    )
}

/// Resolve one named individual.
pub fn champion(name: &str, company: &str, host: &str) -> String {
    format!(
        "# TASK
Find the {host} profile of {name}, who works at {company}.
Search Google for: site:{host}/in \"{name}\" \"{company}\"

# REQUIREMENTS
1. Return exactly one contact: {name}
2. You MUST include the full {host} profile URL (containing /in/)
3. If you cannot find the profile, say so and do not invent a URL

# FORMAT
{CONTACT_FORMAT}"
    )
}

/// Broad single-call search-and-format covering every target role.
///
/// Used only when the bucketed passes leave too few validated profiles.
pub fn full_sweep(company: &str, host: &str) -> String {
    format!(
        "# ROLE
Act as an Executive Sales Researcher. Your goal is to identify high-value decision-makers at {company} by searching {host}.

# TASK
Search {host} to find specific individuals currently working at {company}. Find these three groups:

1. Corporate Leadership: CEO, CMO, CRO, CFO, COO, and Founders
2. Marketing Leadership: VPs and Directors in Marketing
3. Specialists: Anyone with \"ABM\", \"Demand Generation\", or \"Digital Marketing\" in their title

# SEARCH QUERIES TO EXECUTE
site:{host}/in \"{company}\" CEO
site:{host}/in \"{company}\" CMO
site:{host}/in \"{company}\" \"VP Marketing\"
site:{host}/in \"{company}\" \"Director Marketing\"
site:{host}/in \"{company}\" \"Demand Generation\"
site:{host}/in \"{company}\" Founder

# REQUIREMENTS
1. You MUST include the actual profile URL for each person
2. Do NOT use placeholder text like \"[Not available]\"; if you cannot find the URL, omit that person
3. Only include people who CURRENTLY work at {company}
4. Order contacts by seniority (C-Suite first, then VPs, then Directors, then others)
5. Aim to find 8-15 relevant contacts

# FORMAT
{CONTACT_FORMAT}

Now search and find the contacts at {company}:"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_sweep_lists_every_role_once() {
        let roles = vec!["CFO".to_string(), "COO".to_string()];
        let prompt = role_sweep("Acme", &roles, "linkedin.com");
        assert!(prompt.contains("- CFO\n- COO"));
        assert!(prompt.contains("site:linkedin.com/in \"Acme\" \"COO\""));
        assert!(prompt.contains("Title: [Their current title]"));
    }

    #[test]
    fn champion_prompt_names_the_person() {
        let prompt = champion("Jane Smith", "Acme", "linkedin.com");
        assert!(prompt.contains("Return exactly one contact: Jane Smith"));
    }
}
