//! Formatting stages, applied in the order listed in [`crate::format_markup`].
//!
//! Every stage is a pure `Vec<Piece> -> Vec<Piece>` transform. Pieces that a
//! stage turned into [`Piece::Block`] are protected from all later stages.

pub mod fences;
pub mod headings;
pub mod inline;
pub mod lists;
pub mod paragraphs;
pub mod quotes;
pub mod rules;
pub mod tables;

use crate::escape::escape_html;
use crate::piece::Piece;

/// Escape every remaining raw line so later stages only ever see safe text.
pub fn escape_lines(pieces: Vec<Piece>) -> Vec<Piece> {
    pieces
        .into_iter()
        .map(|piece| match piece {
            Piece::Raw(line) => Piece::Line(escape_html(&line)),
            other => other,
        })
        .collect()
}
