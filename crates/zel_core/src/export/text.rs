//! Plain-text rendering of editor HTML.
//!
//! Rules:
//! - `<br>` and closing block tags become line breaks.
//! - Remaining tags are dropped.
//! - Common HTML entities are decoded.
//! - Runs of blank lines collapse to one blank line; output is trimmed.

use once_cell::sync::Lazy;
use regex::Regex;

static LINE_BREAK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<br\s*/?>").expect("valid line break regex"));
static BLOCK_END_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)</(p|div|h[1-6]|li|blockquote|pre|tr)\s*>").expect("valid block end regex")
});
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));
static BLANK_RUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n[ \t]*(\n[ \t]*)+\n").expect("valid blank run regex"));

const ENTITIES: &[(&str, &str)] = &[
    ("&nbsp;", " "),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#39;", "'"),
    ("&apos;", "'"),
    // Last, so `&amp;lt;` decodes to `&lt;` and not `<`.
    ("&amp;", "&"),
];

/// Renders an HTML document body as the text a reader sees.
pub fn html_to_text(html: &str) -> String {
    let with_breaks = LINE_BREAK_RE.replace_all(html, "\n");
    let with_blocks = BLOCK_END_RE.replace_all(&with_breaks, "\n");
    let without_tags = TAG_RE.replace_all(&with_blocks, "");

    let mut decoded = without_tags.into_owned();
    for (entity, replacement) in ENTITIES {
        decoded = decoded.replace(entity, replacement);
    }

    let collapsed = BLANK_RUN_RE.replace_all(&decoded, "\n\n");
    collapsed.trim().to_string()
}
