//! Sanitising: deterministic cleanup of the raw VLM completion.
//!
//! Even with an explicit "return only the note" instruction, VLMs
//! occasionally wrap their answer in artefacts that are *presentation*, not
//! *content*:
//!
//! - ` ``` ` code fences around the whole note (sometimes with an info
//!   string like ` ```markdown `)
//! - a full HTML document, with the actual note buried inside `<body>`
//!
//! This module removes exactly those two artefact classes and nothing else.
//! The transcribed words are never modified: every rule either deletes fence
//! delimiters or unwraps structure around the text.
//!
//! ## Rule order
//!
//! Fences are stripped before the HTML check so a fenced HTML document is
//! still detected. Both rules are idempotent, and so is their composition:
//! `sanitize(sanitize(x)) == sanitize(x)`.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply both cleanup rules to the raw completion, in order.
///
/// 1. Remove every triple-backtick fence delimiter. A delimiter on its own
///    line is removed with the whole line (info string and line break
///    included); an inline occurrence is removed in place.
/// 2. If the text contains an HTML document wrapper, keep only the inner
///    content of the first `body` element.
pub fn sanitize(input: &str) -> String {
    let s = strip_code_fences(input);
    extract_html_body(&s)
}

// ── Rule 1: Strip code-fence delimiters ──────────────────────────────────

static RE_FENCE_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^```[^\n]*\n?").unwrap());

fn strip_code_fences(input: &str) -> String {
    // A fence delimiter line is removed whole: leaving its line break behind
    // would prepend a blank line to the note.
    let without_fence_lines = RE_FENCE_LINE.replace_all(input, "");
    // Any remaining occurrence is mid-line; drop just the delimiter.
    without_fence_lines.replace("```", "")
}

// ── Rule 2: Unwrap stray HTML documents ──────────────────────────────────

static RE_BODY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<body[^>]*>(.*?)</body>").unwrap());

/// Detection matches the wrapper markers literally; extraction is
/// case-insensitive. First `body` pair wins; if the markers are present but
/// no pair matches, the text passes through unchanged.
fn extract_html_body(input: &str) -> String {
    if !input.contains("<!DOCTYPE html>") && !input.contains("<html") {
        return input.to_string();
    }
    match RE_BODY.captures(input) {
        Some(caps) => caps[1].to_string(),
        None => input.to_string(),
    }
}
