//! Post-render cleanup pipeline for lesson HTML.
//!
//! Each pass is a function `&str -> String` applied in sequence. SharePoint
//! text web parts reject scripts and inline handlers, so raw HTML embedded in
//! lessons is scrubbed of them here.

use std::sync::LazyLock;

use regex::Regex;

/// Run the full cleanup pipeline on rendered HTML.
pub(crate) fn run_pipeline(html: &str) -> String {
    let mut result = strip_unsafe_elements(html);
    result = strip_event_handlers(&result);
    result = collapse_blank_lines(&result);
    result.trim().to_string()
}

// ---------------------------------------------------------------------------
// Pass 1: Remove script-like elements
// ---------------------------------------------------------------------------

fn strip_unsafe_elements(html: &str) -> String {
    static BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?is)<(script|style|iframe)\b[^>]*>.*?</(script|style|iframe)\s*>")
            .expect("valid regex")
    });
    static SELF_CLOSING_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?i)<(script|iframe)\b[^>]*/>").expect("valid regex")
    });

    let result = BLOCK_RE.replace_all(html, "");
    SELF_CLOSING_RE.replace_all(&result, "").into_owned()
}

// ---------------------------------------------------------------------------
// Pass 2: Remove inline event handler attributes
// ---------------------------------------------------------------------------

fn strip_event_handlers(html: &str) -> String {
    static HANDLER_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r#"(?i)\s+on[a-z]+\s*=\s*("[^"]*"|'[^']*'|[^\s>]+)"#).expect("valid regex")
    });

    HANDLER_RE.replace_all(html, "").into_owned()
}

// ---------------------------------------------------------------------------
// Pass 3: Collapse runs of blank lines
// ---------------------------------------------------------------------------

fn collapse_blank_lines(html: &str) -> String {
    static BLANK_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

    BLANK_RE.replace_all(html, "\n\n").into_owned()
}
