pub mod http;

use once_cell::sync::Lazy;
use regex::Regex;

static RE_SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Collapse whitespace and decode the handful of HTML entities the listing
/// site actually emits into cell text.
pub fn clean_text(text: &str) -> String {
    let text = text
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ");
    RE_SPACES.replace_all(text.trim(), " ").to_string()
}
