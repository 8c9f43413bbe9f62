//! Final assembly: plain lines between protected blocks become paragraphs.
//!
//! Single newlines inside a paragraph become `<br>`; one or more blank lines
//! (two or more consecutive line breaks) end the paragraph.

use crate::piece::Piece;

pub fn assemble(pieces: Vec<Piece>) -> String {
    let mut blocks: Vec<String> = Vec::new();
    let mut paragraph: Vec<String> = Vec::new();

    for piece in pieces {
        match piece {
            Piece::Line(line) if line.trim().is_empty() => close(&mut paragraph, &mut blocks),
            Piece::Line(line) | Piece::Raw(line) => paragraph.push(line),
            Piece::Block(html) => {
                close(&mut paragraph, &mut blocks);
                blocks.push(html);
            }
        }
    }
    close(&mut paragraph, &mut blocks);
    blocks.join("\n")
}

fn close(paragraph: &mut Vec<String>, blocks: &mut Vec<String>) {
    if paragraph.is_empty() {
        return;
    }
    let body = std::mem::take(paragraph)
        .iter()
        .map(|l| l.trim_end())
        .collect::<Vec<_>>()
        .join("<br>");
    blocks.push(format!("<p>{body}</p>"));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<Piece> {
        text.split('\n').map(|l| Piece::Line(l.to_string())).collect()
    }

    #[test]
    fn single_newline_becomes_break() {
        assert_eq!(assemble(lines("a\nb")), "<p>a<br>b</p>");
    }

    #[test]
    fn blank_line_runs_collapse_into_one_boundary() {
        assert_eq!(assemble(lines("a\n\n\n\nb")), "<p>a</p>\n<p>b</p>");
    }

    #[test]
    fn blocks_are_emitted_verbatim() {
        let mut input = lines("intro");
        input.push(Piece::Block("<hr>".to_string()));
        input.extend(lines("outro"));
        assert_eq!(assemble(input), "<p>intro</p>\n<hr>\n<p>outro</p>");
    }
}
