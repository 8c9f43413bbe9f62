//! Ordered and unordered list items.
//!
//! Consecutive items of the same kind become one list. A line such as
//! `**2. Check the logs**: details` is an ordered item whose number sits
//! inside the bold label.

use crate::piece::{Piece, static_regex};
use crate::stages::inline;

static_regex!(unordered, r"^\s*[-*+]\s+(.+)$");
static_regex!(ordered, r"^\s*(\d{1,9})[.)]\s+(.+)$");
static_regex!(bold_label, r"^\s*\*\*(\d{1,9})[.)]\s*(.+?)\*\*(.*)$");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Ordered,
    Unordered,
}

struct Item {
    kind: ListKind,
    number: u32,
    html: String,
}

pub fn apply(pieces: Vec<Piece>) -> Vec<Piece> {
    let mut out = Vec::with_capacity(pieces.len());
    let mut run: Vec<Item> = Vec::new();

    for piece in pieces {
        let item = match &piece {
            Piece::Line(line) => parse_item(line),
            _ => None,
        };
        match item {
            Some(item) => {
                if run.first().is_some_and(|first| first.kind != item.kind) {
                    out.push(Piece::Block(list_html(&std::mem::take(&mut run))));
                }
                run.push(item);
            }
            None => {
                if !run.is_empty() {
                    out.push(Piece::Block(list_html(&std::mem::take(&mut run))));
                }
                out.push(piece);
            }
        }
    }
    if !run.is_empty() {
        out.push(Piece::Block(list_html(&run)));
    }
    out
}

fn parse_item(line: &str) -> Option<Item> {
    if let Some(caps) = bold_label().captures(line) {
        let label = inline::render(caps[2].trim());
        let rest = inline::render(&caps[3]);
        return Some(Item {
            kind: ListKind::Ordered,
            number: caps[1].parse().unwrap_or(1),
            html: format!("<strong>{label}</strong>{rest}"),
        });
    }
    if let Some(caps) = ordered().captures(line) {
        return Some(Item {
            kind: ListKind::Ordered,
            number: caps[1].parse().unwrap_or(1),
            html: inline::render(caps[2].trim()),
        });
    }
    unordered().captures(line).map(|caps| Item {
        kind: ListKind::Unordered,
        number: 0,
        html: inline::render(caps[1].trim()),
    })
}

fn list_html(items: &[Item]) -> String {
    let Some(first) = items.first() else {
        return String::new();
    };
    let open = match first.kind {
        ListKind::Unordered => "<ul>".to_string(),
        ListKind::Ordered if first.number == 1 => "<ol>".to_string(),
        ListKind::Ordered => format!("<ol start=\"{}\">", first.number),
    };
    let close = match first.kind {
        ListKind::Unordered => "</ul>",
        ListKind::Ordered => "</ol>",
    };
    let body: String = items
        .iter()
        .map(|item| format!("<li>{}</li>", item.html))
        .collect();
    format!("{open}{body}{close}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<Piece> {
        text.lines().map(|l| Piece::Line(l.to_string())).collect()
    }

    #[test]
    fn groups_unordered_items() {
        let out = apply(lines("- a\n* **b**\n+ c"));
        assert_eq!(
            out,
            vec![Piece::Block(
                "<ul><li>a</li><li><strong>b</strong></li><li>c</li></ul>".to_string()
            )]
        );
    }

    #[test]
    fn ordered_list_keeps_start_number() {
        let out = apply(lines("3. three\n4) four"));
        assert_eq!(
            out,
            vec![Piece::Block(
                "<ol start=\"3\"><li>three</li><li>four</li></ol>".to_string()
            )]
        );
    }

    #[test]
    fn bold_label_item() {
        let out = apply(lines("**1. Check locks**: run the query"));
        assert_eq!(
            out,
            vec![Piece::Block(
                "<ol><li><strong>Check locks</strong>: run the query</li></ol>".to_string()
            )]
        );
    }

    #[test]
    fn kind_change_starts_new_list() {
        let out = apply(lines("- a\n1. b\ntext"));
        assert_eq!(out.len(), 3);
        assert_eq!(out[0], Piece::Block("<ul><li>a</li></ul>".to_string()));
        assert_eq!(out[1], Piece::Block("<ol><li>b</li></ol>".to_string()));
        assert_eq!(out[2], Piece::Line("text".to_string()));
    }

    #[test]
    fn emphasis_line_is_not_an_item() {
        let input = lines("*italic* sentence");
        assert_eq!(apply(input.clone()), input);
    }
}
