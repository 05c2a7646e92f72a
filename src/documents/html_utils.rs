//! HTML text extraction for uploaded web pages.

use std::sync::LazyLock;

use regex::Regex;

static DROPPED_BLOCKS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(script|style|nav)[^>]*>.*?</(script|style|nav)>").expect("valid regex")
});
static COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid regex"));
static BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)</?(div|p|br|h[1-6]|li|tr|blockquote|section|article|header|footer|main|aside)[^>]*>")
        .expect("valid regex")
});
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));
static BLANK_LINES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n\s*\n+").expect("valid regex"));

/// Extract readable plain text from HTML content.
///
/// Drops `<script>`, `<style>` and `<nav>`, turns block elements into line
/// breaks, strips the remaining tags and decodes entities.
pub fn html_to_text(html: &str) -> String {
    let text = DROPPED_BLOCKS_RE.replace_all(html, "");
    let text = COMMENT_RE.replace_all(&text, "");
    let text = BLOCK_RE.replace_all(&text, "\n");
    let text = TAG_RE.replace_all(&text, "");

    // Non-breaking spaces become plain spaces
    let text = html_escape::decode_html_entities(&text).replace('\u{a0}', " ");

    BLANK_LINES_RE.replace_all(&text, "\n\n").trim().to_string()
}
