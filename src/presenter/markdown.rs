//! Markdown rendering.

use std::fmt::Write;
use std::path::Path;

use crate::types::ScoredMatch;

const HEADING: &str = "# Context Results";

/// Get syntax highlighting language for a file extension.
fn language_for_extension(ext: &str) -> &'static str {
    match ext.to_lowercase().as_str() {
        "ts" => "typescript",
        "tsx" => "tsx",
        "js" | "mjs" | "cjs" => "javascript",
        "jsx" => "jsx",
        "py" => "python",
        "rb" => "ruby",
        "go" => "go",
        "rs" => "rust",
        "java" => "java",
        "kt" => "kotlin",
        "cs" => "csharp",
        "cpp" | "cc" | "cxx" | "hpp" => "cpp",
        "c" | "h" => "c",
        "swift" => "swift",
        "php" => "php",
        "sql" => "sql",
        "json" => "json",
        "yaml" | "yml" => "yaml",
        "md" => "markdown",
        "html" => "html",
        "css" => "css",
        "scss" => "scss",
        "vue" => "vue",
        "svelte" => "svelte",
        "toml" => "toml",
        "xml" => "xml",
        "sh" | "bash" => "bash",
        "ps1" => "powershell",
        _ => "",
    }
}

fn language_for_location(location: &str) -> &'static str {
    Path::new(location)
        .extension()
        .map(|ext| language_for_extension(&ext.to_string_lossy()))
        .unwrap_or("")
}

/// A backtick fence longer than any run inside the snippet.
fn fence_for(snippet: &str) -> String {
    let mut longest = 0;
    let mut run = 0;
    for ch in snippet.chars() {
        if ch == '`' {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    "`".repeat((longest + 1).max(3))
}

pub(super) fn render(ranked: &[ScoredMatch]) -> String {
    if ranked.is_empty() {
        return format!("{}\n\nNo results.\n", HEADING);
    }

    let mut out = String::new();
    let noun = if ranked.len() == 1 { "match" } else { "matches" };
    let _ = writeln!(out, "{}\n", HEADING);
    let _ = writeln!(out, "Found {} {}.", ranked.len(), noun);

    for (i, scored) in ranked.iter().enumerate() {
        let item = &scored.item;
        let fence = fence_for(&item.snippet);

        let _ = writeln!(out, "\n## {}. `{}`\n", i + 1, item.location);
        let _ = writeln!(out, "| Score | Source |");
        let _ = writeln!(out, "|-------|--------|");
        let _ = writeln!(out, "| {:.4} | {} |", scored.score, item.source);
        if let Some(modified) = item.modified_at {
            let _ = writeln!(out, "\nModified: {}", modified.format("%Y-%m-%d %H:%M:%S UTC"));
        }
        let _ = writeln!(
            out,
            "\n{}{}\n{}\n{}",
            fence,
            language_for_location(&item.location),
            item.snippet.trim_end(),
            fence
        );
    }

    out
}
