#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

//! Text to markup conversion for streamed answers.
//!
//! Only a practical subset of markdown is recognized: pipe tables, fenced
//! and inline code, headings, emphasis, rules, lists, quotes and links.

mod escape;
mod markup;
mod piece;
mod stages;

pub use escape::escape_html;
pub use markup::{Tip, references_markup, tip_markup};

use piece::{Piece, static_regex};
use tracing::trace;

static_regex!(heading_marker, r"(?m)^\s*#{1,4}\s");

/// Whether the text carries anything the full pipeline would act on.
///
/// A heuristic: stray emphasis characters in plain prose can still trigger
/// it, which only costs a pass through the pipeline.
#[must_use]
pub fn looks_like_markup(text: &str) -> bool {
    text.contains("**")
        || text.contains('`')
        || heading_marker().is_match(text)
        || text.lines().any(|line| {
            let t = line.trim();
            stages::rules::is_rule(t) || (t.len() >= 2 && t.starts_with('|') && t.ends_with('|'))
        })
}

/// Convert answer text to markup. Pure; see [`ContentFormatter`] for the
/// memoized entry point.
#[must_use]
pub fn format_markup(text: &str) -> String {
    if !looks_like_markup(text) {
        return format!("<pre class=\"plain-answer\">{}</pre>", escape_html(text));
    }

    let pieces: Vec<Piece> = text.lines().map(|l| Piece::Raw(l.to_string())).collect();
    let pieces = stages::fences::extract(pieces);
    let pieces = stages::tables::extract(pieces);
    let pieces = stages::escape_lines(pieces);
    let pieces = stages::headings::apply(pieces);
    let pieces = stages::rules::apply(pieces);
    let pieces = stages::lists::apply(pieces);
    let pieces = stages::quotes::apply(pieces);
    let pieces = stages::inline::apply(pieces);
    stages::paragraphs::assemble(pieces)
}

#[derive(Debug, Clone)]
struct FormatCache {
    input: String,
    output: String,
}

/// Formatter that remembers its most recent input and output.
///
/// Streaming renders the same accumulated text more than once (the final
/// render repeats the last debounced one), so a single-entry cache is
/// enough.
#[derive(Debug, Default)]
pub struct ContentFormatter {
    cache: Option<FormatCache>,
    hits: u64,
}

impl ContentFormatter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn format(&mut self, text: &str) -> String {
        if let Some(cache) = self.cache.as_ref().filter(|c| c.input == text) {
            self.hits += 1;
            trace!(len = text.len(), "format cache hit");
            return cache.output.clone();
        }
        let output = format_markup(text);
        self.cache = Some(FormatCache {
            input: text.to_string(),
            output: output.clone(),
        });
        output
    }

    /// Number of calls answered from the cache.
    #[must_use]
    pub const fn cache_hits(&self) -> u64 {
        self.hits
    }

    pub fn clear_cache(&mut self) {
        self.cache = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_takes_the_fast_path() {
        assert_eq!(
            format_markup("plain sentence, no markup"),
            "<pre class=\"plain-answer\">plain sentence, no markup</pre>"
        );
    }

    #[test]
    fn fast_path_escapes_and_keeps_whitespace() {
        assert_eq!(
            format_markup("a < b\n\n  indented"),
            "<pre class=\"plain-answer\">a &lt; b\n\n  indented</pre>"
        );
    }

    #[test]
    fn markup_triggers() {
        assert!(looks_like_markup("some **bold**"));
        assert!(looks_like_markup("run `ls`"));
        assert!(looks_like_markup("intro\n## Title"));
        assert!(looks_like_markup("a\n---\nb"));
        assert!(looks_like_markup("| a |"));
        assert!(!looks_like_markup("C# and F# are languages"));
        assert!(!looks_like_markup("- just a list\n- of items"));
    }

    #[test]
    fn cache_returns_identical_output() {
        let mut formatter = ContentFormatter::new();
        let text = "# Title\n\nSome **bold** text";
        let cold = formatter.format(text);
        let warm = formatter.format(text);
        assert_eq!(cold, warm);
        assert_eq!(formatter.cache_hits(), 1);
        assert_eq!(cold, format_markup(text));
    }

    #[test]
    fn cache_misses_on_different_input() {
        let mut formatter = ContentFormatter::new();
        formatter.format("**a**");
        formatter.format("**b**");
        assert_eq!(formatter.cache_hits(), 0);
        formatter.clear_cache();
        formatter.format("**b**");
        assert_eq!(formatter.cache_hits(), 0);
    }
}
