//! Plain-text rendering for terminals.

use std::fmt::Write;

use crate::types::ScoredMatch;

/// Longest snippet line printed before truncation.
const MAX_LINE_CHARS: usize = 120;

fn truncate_line(line: &str) -> String {
    if line.chars().count() <= MAX_LINE_CHARS {
        return line.to_string();
    }
    let kept: String = line.chars().take(MAX_LINE_CHARS - 3).collect();
    format!("{}...", kept)
}

pub(super) fn render(ranked: &[ScoredMatch]) -> String {
    if ranked.is_empty() {
        return "No results.\n".to_string();
    }

    let width = ranked.len().to_string().len();
    let mut out = String::new();

    for (i, scored) in ranked.iter().enumerate() {
        let item = &scored.item;
        let _ = writeln!(
            out,
            "{:>width$}. {}  [{:.4}, {}]",
            i + 1,
            item.location,
            scored.score,
            item.source,
            width = width
        );
        for line in item.snippet.lines() {
            let _ = writeln!(out, "{:width$}    {}", "", truncate_line(line), width = width);
        }
    }

    out
}
