//! Parsing of model free text into queries and control signals.
//!
//! The planner's contract with the model is deliberately loose: queries come
//! back as bullet points or plain lines, and loop termination is signalled by
//! a fixed sentinel token. This module is the single place where those string
//! rules live.
//!
//! Edge cases handled here:
//! - blank lines are discarded
//! - leading bullet markers (`-`, `*`, `•`) and numbered prefixes
//!   (`1.`, `2)`) are stripped
//! - the sentinel matches as a substring anywhere in the response, and wins
//!   over any other content present

/// Marker the planner emits when no further searches are needed.
pub const DONE_SENTINEL: &str = "<done>";

/// Returns true if the raw completion text signals loop termination.
pub fn contains_done(text: &str) -> bool {
    text.contains(DONE_SENTINEL)
}

/// Split completion text into one query per line, stripping bullet markers
/// and surrounding whitespace and discarding blank lines.
pub fn parse_query_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(strip_bullet)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn strip_bullet(line: &str) -> &str {
    let mut rest = line.trim();

    // Bullet markers, possibly repeated ("- - query" from over-eager models).
    loop {
        let stripped = rest
            .strip_prefix('-')
            .or_else(|| rest.strip_prefix('*'))
            .or_else(|| rest.strip_prefix('•'));
        match stripped {
            Some(s) => rest = s.trim_start(),
            None => break,
        }
    }

    // Numbered prefixes: "1. query" or "2) query".
    let digits = rest.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        let after = &rest[digits..];
        if let Some(s) = after.strip_prefix('.').or_else(|| after.strip_prefix(')')) {
            if s.starts_with(char::is_whitespace) {
                rest = s.trim_start();
            }
        }
    }

    rest.trim_end()
}

/// Truncate to at most `max` characters, respecting char boundaries.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
