//! Horizontal rules: three or more `-`, `*` or `_`, optionally spaced.

use crate::piece::Piece;

pub fn apply(pieces: Vec<Piece>) -> Vec<Piece> {
    pieces
        .into_iter()
        .map(|piece| match piece {
            Piece::Line(line) if is_rule(&line) => Piece::Block("<hr>".to_string()),
            other => other,
        })
        .collect()
}

pub fn is_rule(line: &str) -> bool {
    let compact: Vec<char> = line.chars().filter(|c| !c.is_whitespace()).collect();
    compact.len() >= 3
        && matches!(compact[0], '-' | '*' | '_')
        && compact.iter().all(|c| *c == compact[0])
}
