//! Extractive chunk summaries.

use crate::chunking::sentence_spans;

/// Default summary length in chars
pub const DEFAULT_SUMMARY_CHARS: usize = 280;

/// Leading whole sentences of `text` that fit within `max_chars`.
///
/// When the first sentence alone is too long it is cut at a word boundary
/// and suffixed with an ellipsis; the result never exceeds `max_chars`.
pub fn extractive_summary(text: &str, max_chars: usize) -> String {
    let max_chars = max_chars.max(1);
    let chars: Vec<char> = text.chars().collect();
    let spans = sentence_spans(&chars);
    let Some(&(start, first_end)) = spans.first() else {
        return String::new();
    };

    if first_end - start > max_chars {
        return truncate_at_word(&chars[start..first_end], max_chars);
    }

    let end = spans
        .iter()
        .take_while(|(_, end)| end - start <= max_chars)
        .last()
        .map_or(first_end, |&(_, end)| end);

    chars[start..end]
        .iter()
        .map(|&c| if c == '\n' { ' ' } else { c })
        .collect::<String>()
        .split(' ')
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn truncate_at_word(chars: &[char], max_chars: usize) -> String {
    let window = &chars[..max_chars - 1];
    let cut = if chars[max_chars - 1].is_whitespace() {
        window.len()
    } else {
        window
            .iter()
            .rposition(|c| c.is_whitespace())
            .filter(|&pos| pos > 0)
            .unwrap_or(window.len())
    };

    let mut summary: String = window[..cut].iter().collect();
    summary.truncate(summary.trim_end().len());
    summary.push('…');
    summary
}
