//! ATX headings with one to four leading hashes.

use crate::piece::{Piece, static_regex};
use crate::stages::inline;

// `**## Title**` and `## **Title**`: the bold wrapper is dropped.
static_regex!(bold_heading, r"^\s*\*\*(#{1,4})\s+(.+?)\*\*\s*$");
static_regex!(heading_bold, r"^\s*(#{1,4})\s+\*\*(.+?)\*\*\s*$");
static_regex!(heading, r"^\s*(#{1,4})\s+(.+?)(?:\s+#+)?\s*$");

pub fn apply(pieces: Vec<Piece>) -> Vec<Piece> {
    pieces
        .into_iter()
        .map(|piece| match piece {
            Piece::Line(line) => heading_html(&line).map_or(Piece::Line(line), Piece::Block),
            other => other,
        })
        .collect()
}

fn heading_html(line: &str) -> Option<String> {
    let caps = bold_heading()
        .captures(line)
        .or_else(|| heading_bold().captures(line))
        .or_else(|| heading().captures(line))?;
    let level = caps[1].len();
    let text = inline::render(caps[2].trim());
    Some(format!("<h{level}>{text}</h{level}>"))
}
