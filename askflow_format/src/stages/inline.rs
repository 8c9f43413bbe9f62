//! Inline substitutions on escaped text: code spans, then emphasis, then links.
//!
//! Code spans and links are masked first so emphasis markers inside
//! backticks or link targets are never interpreted, while emphasis may
//! still wrap a whole code span or link.

use crate::piece::{Piece, static_regex};

static_regex!(code_span, r"`([^`]+)`");
static_regex!(strong_em, r"\*\*\*([^*\s](?:[^*]*[^*\s])?)\*\*\*");
static_regex!(bold, r"\*\*([^*\s](?:.*?[^*\s])?)\*\*");
static_regex!(italic, r"\*([^*\s](?:[^*]*[^*\s])?)\*");
static_regex!(link, r"\[([^\]]+)\]\(((?:[^()\s]|\([^()\s]*\))+)\)");
static_regex!(code_placeholder, r"\x{E000}(\d+)\x{E001}");
static_regex!(link_placeholder, r"\x{E002}(\d+)\x{E003}");

/// Private-use delimiters masking code spans and links while emphasis runs.
const SPAN_OPEN: char = '\u{E000}';
const SPAN_CLOSE: char = '\u{E001}';
const LINK_OPEN: char = '\u{E002}';
const LINK_CLOSE: char = '\u{E003}';

pub fn apply(pieces: Vec<Piece>) -> Vec<Piece> {
    pieces
        .into_iter()
        .map(|piece| match piece {
            Piece::Line(line) => Piece::Line(render(&line)),
            other => other,
        })
        .collect()
}

/// Render inline markup inside one escaped line.
#[must_use]
pub fn render(escaped: &str) -> String {
    if escaped.is_empty() {
        return String::new();
    }

    let mut spans: Vec<String> = Vec::new();
    let masked = if escaped.contains('`') {
        code_span().replace_all(escaped, |caps: &regex::Captures<'_>| {
            spans.push(caps[1].to_string());
            format!("{SPAN_OPEN}{}{SPAN_CLOSE}", spans.len() - 1)
        })
    } else {
        escaped.into()
    };

    let mut links: Vec<String> = Vec::new();
    let masked = link().replace_all(&masked, |caps: &regex::Captures<'_>| {
        links.push(anchor(&caps[1], &caps[2]));
        format!("{LINK_OPEN}{}{LINK_CLOSE}", links.len() - 1)
    });

    let formatted = emphasis(&masked);
    let formatted = restore(link_placeholder(), &formatted, &|idx| {
        links.get(idx).cloned().unwrap_or_default()
    });
    restore(code_placeholder(), &formatted, &|idx| {
        let code = spans.get(idx).map_or("", String::as_str);
        format!("<code>{code}</code>")
    })
}

fn restore(pattern: &regex::Regex, text: &str, lookup: &impl Fn(usize) -> String) -> String {
    pattern
        .replace_all(text, |caps: &regex::Captures<'_>| {
            caps[1].parse::<usize>().map_or_else(|_| String::new(), lookup)
        })
        .into_owned()
}

fn emphasis(text: &str) -> String {
    let text = strong_em().replace_all(text, "<strong><em>$1</em></strong>");
    let text = bold().replace_all(&text, "<strong>$1</strong>");
    italic().replace_all(&text, "<em>$1</em>").into_owned()
}

/// Anchor for a link; unsafe targets keep only the label.
fn anchor(label: &str, href: &str) -> String {
    let label = emphasis(label);
    if is_safe_href(href) {
        format!("<a href=\"{href}\" target=\"_blank\" rel=\"noopener noreferrer\">{label}</a>")
    } else {
        label
    }
}

fn is_safe_href(href: &str) -> bool {
    let lower = href.to_ascii_lowercase();
    match lower.split_once(':') {
        Some((scheme, _)) if !scheme.contains('/') => {
            matches!(scheme, "http" | "https" | "mailto")
        }
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bold_and_italic() {
        assert_eq!(
            render("a **b** and *c* d"),
            "a <strong>b</strong> and <em>c</em> d"
        );
    }

    #[test]
    fn code_is_processed_before_emphasis() {
        assert_eq!(
            render("use `a*b*c` or **`x`**"),
            "use <code>a*b*c</code> or <strong><code>x</code></strong>"
        );
    }

    #[test]
    fn emphasis_does_not_span_code() {
        assert_eq!(
            render("*start `mid* end`"),
            "*start <code>mid* end</code>"
        );
    }

    #[test]
    fn lone_asterisks_are_literal() {
        assert_eq!(render("2 * 3 * 4"), "2 * 3 * 4");
    }

    #[test]
    fn links_open_in_new_tab() {
        assert_eq!(
            render("see [docs](https://example.com/a?b=1&amp;c=2)"),
            "see <a href=\"https://example.com/a?b=1&amp;c=2\" target=\"_blank\" \
             rel=\"noopener noreferrer\">docs</a>"
        );
    }

    #[test]
    fn script_links_keep_only_label() {
        assert_eq!(render("[click](javascript:alert(1))"), "click");
        assert_eq!(
            render("[rel](/path/page)"),
            "<a href=\"/path/page\" target=\"_blank\" rel=\"noopener noreferrer\">rel</a>"
        );
    }

    #[test]
    fn link_targets_keep_one_level_of_parentheses() {
        assert_eq!(
            render("[Rust](https://en.wikipedia.org/wiki/Rust_(language)) here"),
            "<a href=\"https://en.wikipedia.org/wiki/Rust_(language)\" target=\"_blank\" \
             rel=\"noopener noreferrer\">Rust</a> here"
        );
    }

    #[test]
    fn triple_stars_nest_strong_and_em() {
        assert_eq!(
            render("This is ***very important*** text"),
            "This is <strong><em>very important</em></strong> text"
        );
    }

    #[test]
    fn emphasis_markers_in_link_targets_are_untouched() {
        assert_eq!(
            render("**see** [docs](https://x.org/a*b*c)"),
            "<strong>see</strong> <a href=\"https://x.org/a*b*c\" target=\"_blank\" \
             rel=\"noopener noreferrer\">docs</a>"
        );
    }

    #[test]
    fn link_labels_keep_emphasis_and_code() {
        assert_eq!(
            render("[**bold** `x`](/p)"),
            "<a href=\"/p\" target=\"_blank\" rel=\"noopener noreferrer\">\
             <strong>bold</strong> <code>x</code></a>"
        );
    }
}
