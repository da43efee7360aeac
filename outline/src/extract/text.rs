//! Text helpers for paragraph cleanup, step detection and table header
//! inference.

use std::sync::LazyLock;

use regex::Regex;

/// Header used for bullet tables when no better one can be inferred.
pub const DEFAULT_TABLE_HEADER: &str = "Elements";

static MARKDOWN_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[([^\]]+)\]\([^)]+\)").expect("link pattern is valid")
});

static STEP_KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(given|when|then|and)").expect("step pattern is valid"));

static FOLLOWING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)following\s").expect("following pattern is valid"));

/// Unwrap `[label](url)` links to their label, drop every line break and trim.
pub fn clean_paragraph(text: &str) -> String {
    let unlinked = MARKDOWN_LINK.replace_all(text, "$1");
    unlinked
        .chars()
        .filter(|c| *c != '\n' && *c != '\r')
        .collect::<String>()
        .trim()
        .to_string()
}

/// Whether the text opens with a Given/When/Then/And keyword, in any case.
///
/// Only the prefix is checked, so `Andrew logs in` counts as a step.
pub fn is_step(text: &str) -> bool {
    STEP_KEYWORD.is_match(text)
}

/// Infer the bullet-table header from a step such as
/// `Then I see the following errors:` (gives `Errors`).
///
/// Words after `following` are collected up to and including the first one
/// ending in `s`. Without such a word the `fallback` is returned.
pub fn infer_table_header(step: &str, fallback: &str) -> String {
    let Some(found) = FOLLOWING.find(step) else {
        return fallback.to_string();
    };

    let mut words: Vec<String> = Vec::new();
    for word in step[found.end()..].split_whitespace() {
        let word = word.replace(':', "");
        if word.is_empty() {
            continue;
        }
        let plural = word.to_lowercase().ends_with('s');
        words.push(word);
        if plural {
            return capitalize(&words.join(" "));
        }
    }

    fallback.to_string()
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
