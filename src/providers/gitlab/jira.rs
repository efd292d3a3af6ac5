use std::sync::LazyLock;

use regex::Regex;

use super::types::Jira;

/// `[KEY-123]`: upper-case ASCII project key, a hyphen, then digits.
static JIRA_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([A-Z]+-[0-9]+)\]").expect("valid regex"));

/// Extracts the first bracketed Jira key from `text`.
///
/// Always `None` when no Jira instance is configured. Matching is
/// case-sensitive: `[abc-1]` is not a key.
pub fn extract_jira_reference(text: &str, jira_base_url: Option<&str>) -> Option<Jira> {
    let base = jira_base_url.filter(|b| !b.trim().is_empty())?;
    let key = JIRA_KEY_RE.captures(text)?.get(1)?.as_str();

    Some(Jira {
        key: key.to_string(),
        url: format!("{base}/browse/{key}"),
    })
}
