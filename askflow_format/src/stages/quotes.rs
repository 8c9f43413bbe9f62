//! Block quotes.
//!
//! Second line-classification pass: consecutive lines starting with an
//! (escaped) `>` are aggregated into one quote. Protected blocks and
//! ordinary lines both end the current quote.

use crate::piece::Piece;
use crate::stages::inline;

const QUOTE_MARKER: &str = "&gt;";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineClass {
    Quote,
    Other,
}

fn classify(piece: &Piece) -> LineClass {
    match piece {
        Piece::Line(line) if line.trim_start().starts_with(QUOTE_MARKER) => LineClass::Quote,
        _ => LineClass::Other,
    }
}

pub fn apply(pieces: Vec<Piece>) -> Vec<Piece> {
    let mut out = Vec::with_capacity(pieces.len());
    let mut quoted: Vec<String> = Vec::new();

    for piece in pieces {
        match (classify(&piece), piece) {
            (LineClass::Quote, Piece::Line(line)) => quoted.push(strip_marker(&line)),
            (_, other) => {
                if !quoted.is_empty() {
                    out.push(Piece::Block(quote_html(&std::mem::take(&mut quoted))));
                }
                out.push(other);
            }
        }
    }
    if !quoted.is_empty() {
        out.push(Piece::Block(quote_html(&quoted)));
    }
    out
}

fn strip_marker(line: &str) -> String {
    let rest = line
        .trim_start()
        .strip_prefix(QUOTE_MARKER)
        .unwrap_or(line);
    rest.strip_prefix(' ').unwrap_or(rest).to_string()
}

fn quote_html(lines: &[String]) -> String {
    let body = lines
        .iter()
        .map(|l| inline::render(l))
        .collect::<Vec<_>>()
        .join("<br>");
    format!("<blockquote>{body}</blockquote>")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<Piece> {
        text.lines().map(|l| Piece::Line(l.to_string())).collect()
    }

    #[test]
    fn aggregates_consecutive_quote_lines() {
        let out = apply(lines("&gt; first\n&gt; **second**\nafter"));
        assert_eq!(
            out,
            vec![
                Piece::Block("<blockquote>first<br><strong>second</strong></blockquote>".to_string()),
                Piece::Line("after".to_string()),
            ]
        );
    }

    #[test]
    fn protected_block_splits_quotes() {
        let mut input = lines("&gt; a");
        input.push(Piece::Block("<hr>".to_string()));
        input.extend(lines("&gt; b"));
        let out = apply(input);
        assert_eq!(
            out,
            vec![
                Piece::Block("<blockquote>a</blockquote>".to_string()),
                Piece::Block("<hr>".to_string()),
                Piece::Block("<blockquote>b</blockquote>".to_string()),
            ]
        );
    }

    #[test]
    fn arrows_inside_text_are_not_quotes() {
        let input = lines("a -&gt; b");
        assert_eq!(apply(input.clone()), input);
    }
}
