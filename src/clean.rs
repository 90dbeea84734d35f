//! Text cleaning for extracted document text.
//!
//! Extractors hand back text with layout noise: Windows line endings,
//! zero-width characters, non-breaking spaces, hyphenated line breaks from
//! PDF justification and long runs of blank lines. [`clean_text`]
//! normalizes all of that while keeping paragraph structure intact.

use std::sync::LazyLock;

use regex::Regex;

static SPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" {2,}").expect("valid regex"));

static BLANK_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

/// Normalize raw extracted text.
///
/// Idempotent: cleaning already-clean text returns it unchanged.
pub fn clean_text(raw: &str) -> String {
    let normalized = normalize_chars(&raw.replace("\r\n", "\n").replace('\r', "\n"));

    // Hyphen breaks are rejoined line by line
    let mut text = String::with_capacity(normalized.len());
    for (i, line) in normalized.lines().enumerate() {
        let line = SPACE_RUN.replace_all(line.trim(), " ");
        if ends_with_hyphen_break(&text) && starts_lowercase(&line) {
            text.pop();
        } else if i > 0 {
            text.push('\n');
        }
        text.push_str(&line);
    }

    BLANK_RUN.replace_all(&text, "\n\n").trim().to_string()
}

/// `word-` at the end of a line, as left by hyphenation
fn ends_with_hyphen_break(text: &str) -> bool {
    let mut tail = text.chars().rev();
    tail.next() == Some('-') && tail.next().is_some_and(char::is_lowercase)
}

fn starts_lowercase(line: &str) -> bool {
    line.chars().next().is_some_and(char::is_lowercase)
}

fn normalize_chars(text: &str) -> String {
    text.chars()
        .filter_map(|c| match c {
            '\n' => Some('\n'),
            // zero-width space/joiners, BOM, soft hyphen
            '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{2060}' | '\u{FEFF}' | '\u{00AD}' => None,
            '\t' | '\u{00A0}' | '\u{2007}' | '\u{202F}' | '\u{3000}' => Some(' '),
            c if ('\u{2000}'..='\u{200A}').contains(&c) => Some(' '),
            c if c.is_control() => None,
            c => Some(c),
        })
        .collect()
}

/// Count whitespace-separated words
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
