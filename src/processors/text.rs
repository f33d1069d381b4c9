//! Text cleanup applied to raw recognizer output.

use once_cell::sync::Lazy;
use regex::Regex;

// Shared regex patterns
static MULTI_DOTS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.{2,}").expect("static regex"));
static SPACED_DOTS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.\s*\.\s*\.").expect("static regex"));
static QUESTION_BANG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\?\s*!\s*").expect("static regex"));
static BANG_QUESTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*!\s*\?\s*").expect("static regex"));
static MULTI_QUESTION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\?{2,}!*").expect("static regex"));
static MULTI_BANG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"!{2,}\?*").expect("static regex"));
static SPACE_BEFORE_PUNCT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+([?!.,:;])").expect("static regex"));
static SPACE_AFTER_PUNCT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([?!.,:;])\s+").expect("static regex"));
static SPACED_DASH_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s-\s").expect("static regex"));
static LEADING_DASH_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-\s").expect("static regex"));
static TRAILING_DASH_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s-$").expect("static regex"));

/// Canonicalize punctuation in recognized text.
///
/// Ellipsis variants collapse to `...`, mixed `?`/`!` runs collapse to
/// `?!`, whitespace hugging punctuation is removed, and a bare hyphen
/// surrounded by spaces becomes an em-dash.
pub fn normalize_punctuation(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let mut result = text.to_string();

    // Ellipsis variants: "..", ". . .", "…" and friends.
    result = MULTI_DOTS_RE.replace_all(&result, "...").to_string();
    result = SPACED_DOTS_RE.replace_all(&result, "...").to_string();
    result = result.replace('…', "...");

    // Question/exclamation mixtures collapse to a canonical "?!".
    result = QUESTION_BANG_RE.replace_all(&result, "?!").to_string();
    result = BANG_QUESTION_RE.replace_all(&result, "?!").to_string();
    result = MULTI_QUESTION_RE.replace_all(&result, "?!").to_string();
    result = MULTI_BANG_RE.replace_all(&result, "?!").to_string();

    // Drop whitespace hugging punctuation on either side.
    result = SPACE_BEFORE_PUNCT_RE.replace_all(&result, "$1").to_string();
    result = SPACE_AFTER_PUNCT_RE.replace_all(&result, "$1").to_string();

    // A lone hyphen between spaces reads as a dash.
    result = SPACED_DASH_RE.replace_all(&result, " \u{2014} ").to_string();
    result = LEADING_DASH_RE.replace_all(&result, "\u{2014} ").to_string();
    result = TRAILING_DASH_RE.replace_all(&result, " \u{2014}").to_string();

    result.trim().to_string()
}

/// Normalize raw engine output.
///
/// Embedded line-break markers become real newlines, a leading
/// "assistant:"-style role prefix is stripped, and results that are
/// empty after trimming collapse to the empty string before the
/// punctuation pass runs.
pub fn normalize_recognized_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let cleaned = text
        .replace("<br />", "\n")
        .replace("<br/>", "\n")
        .replace("<br>", "\n")
        .replace("\\n", "\n");
    let mut cleaned = cleaned.trim().to_string();

    if cleaned.to_lowercase().starts_with("assistant:") {
        cleaned = cleaned
            .split_once(':')
            .map(|(_, rest)| rest.trim_start().to_string())
            .unwrap_or_default();
    }

    if cleaned.trim().is_empty() {
        return String::new();
    }

    normalize_punctuation(&cleaned)
}
