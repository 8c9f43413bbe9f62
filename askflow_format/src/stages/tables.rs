//! Pipe tables.
//!
//! A line classifier walks the raw lines: a line that starts and ends with
//! `|` is a table row, anything else closes the current block. A second row
//! made only of pipes, dashes and colons is the header separator and is
//! dropped. Blocks with fewer than two valid rows (header plus at least one
//! body row) are given back as literal lines.

use crate::escape::escape_html;
use crate::piece::Piece;
use crate::stages::inline;

/// Line-break marker models emit inside cells; kept as a single token.
const CELL_BREAK: &str = "<br>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineClass {
    Row,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    None,
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum CellToken {
    Text(String),
    Break,
}

type Cell = Vec<CellToken>;

fn classify(line: &str) -> LineClass {
    let t = line.trim();
    if t.len() >= 2 && t.starts_with('|') && t.ends_with('|') {
        LineClass::Row
    } else {
        LineClass::Other
    }
}

/// Whether a row line could only be a header separator such as `| :-- | --: |`.
pub fn is_separator(line: &str) -> bool {
    let t = line.trim();
    t.contains('-') && t.chars().all(|c| matches!(c, '|' | '-' | ':' | ' ' | '\t'))
}

pub fn extract(pieces: Vec<Piece>) -> Vec<Piece> {
    let mut out = Vec::with_capacity(pieces.len());
    let mut block: Vec<String> = Vec::new();

    for piece in pieces {
        match piece {
            Piece::Raw(line) if classify(&line) == LineClass::Row => block.push(line),
            other => {
                flush(&mut block, &mut out);
                out.push(other);
            }
        }
    }
    flush(&mut block, &mut out);
    out
}

fn flush(block: &mut Vec<String>, out: &mut Vec<Piece>) {
    if block.is_empty() {
        return;
    }
    let lines = std::mem::take(block);
    match render_table(&lines) {
        Some(html) => out.push(Piece::Block(html)),
        None => out.extend(lines.into_iter().map(Piece::Raw)),
    }
}

fn render_table(lines: &[String]) -> Option<String> {
    let mut aligns = Vec::new();
    let mut rows: Vec<Vec<Cell>> = Vec::with_capacity(lines.len());

    for (idx, line) in lines.iter().enumerate() {
        if idx == 1 && is_separator(line) {
            aligns = split_row(line).iter().map(|c| alignment(c)).collect();
            continue;
        }
        let cells = split_row(line);
        if cells.iter().any(|c| !c.is_empty()) {
            rows.push(cells);
        }
    }

    if rows.len() < 2 {
        return None;
    }

    let header = &rows[0];
    let arity = header.len();
    let align_of = |col: usize| aligns.get(col).copied().unwrap_or(Align::None);

    let mut html = String::from("<table class=\"md-table\"><thead><tr>");
    for (col, cell) in header.iter().enumerate() {
        html.push_str(&cell_html("th", cell, align_of(col)));
    }
    html.push_str("</tr></thead><tbody>");
    for row in &rows[1..] {
        html.push_str("<tr>");
        for col in 0..arity {
            let cell = row.get(col).cloned().unwrap_or_default();
            html.push_str(&cell_html("td", &cell, align_of(col)));
        }
        html.push_str("</tr>");
    }
    html.push_str("</tbody></table>");
    Some(html)
}

/// Split a row into cells, dropping the outer pipes. `\|` is a literal pipe
/// and code spans are kept whole.
fn split_row(line: &str) -> Vec<Cell> {
    let t = line.trim();
    let inner = t.strip_prefix('|').unwrap_or(t);
    let inner = inner.strip_suffix('|').unwrap_or(inner);

    let mut cells = Vec::new();
    let mut cell: Cell = Vec::new();
    let mut text = String::new();
    let mut rest = inner;

    while let Some(c) = rest.chars().next() {
        if rest.starts_with(CELL_BREAK) {
            push_text(&mut cell, &mut text);
            cell.push(CellToken::Break);
            rest = &rest[CELL_BREAK.len()..];
            continue;
        }
        if rest.starts_with("\\|") {
            text.push('|');
            rest = &rest[2..];
            continue;
        }
        if c == '`' {
            if let Some(end) = rest[1..].find('`') {
                let span_len = end + 2;
                text.push_str(&rest[..span_len]);
                rest = &rest[span_len..];
                continue;
            }
        }
        if c == '|' {
            push_text(&mut cell, &mut text);
            cells.push(std::mem::take(&mut cell));
        } else {
            text.push(c);
        }
        rest = &rest[c.len_utf8()..];
    }
    push_text(&mut cell, &mut text);
    cells.push(cell);
    cells
}

fn push_text(cell: &mut Cell, text: &mut String) {
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        cell.push(CellToken::Text(trimmed.to_string()));
    }
    text.clear();
}

fn alignment(cell: &Cell) -> Align {
    let marker: String = cell
        .iter()
        .filter_map(|t| match t {
            CellToken::Text(s) => Some(s.as_str()),
            CellToken::Break => None,
        })
        .collect();
    match (marker.starts_with(':'), marker.ends_with(':')) {
        (true, true) => Align::Center,
        (false, true) => Align::Right,
        (true, false) => Align::Left,
        (false, false) => Align::None,
    }
}

fn cell_html(tag: &str, cell: &Cell, align: Align) -> String {
    let style = match align {
        Align::None => "",
        Align::Left => " style=\"text-align:left\"",
        Align::Center => " style=\"text-align:center\"",
        Align::Right => " style=\"text-align:right\"",
    };
    let body: String = cell
        .iter()
        .map(|token| match token {
            CellToken::Text(s) => inline::render(&escape_html(s)),
            CellToken::Break => "<br>".to_string(),
        })
        .collect();
    format!("<{tag}{style}>{body}</{tag}>")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(text: &str) -> Vec<Piece> {
        text.lines().map(|l| Piece::Raw(l.to_string())).collect()
    }

    #[test]
    fn classifies_rows() {
        assert_eq!(classify("| a | b |"), LineClass::Row);
        assert_eq!(classify("  |x|  "), LineClass::Row);
        assert_eq!(classify("| a | b"), LineClass::Other);
        assert_eq!(classify("|"), LineClass::Other);
    }

    #[test]
    fn renders_header_and_body() {
        let out = extract(raw("| A | B |\n| - | - |\n| 1 | 2 |"));
        assert_eq!(
            out,
            vec![Piece::Block(
                "<table class=\"md-table\"><thead><tr><th>A</th><th>B</th></tr></thead>\
                 <tbody><tr><td>1</td><td>2</td></tr></tbody></table>"
                    .to_string()
            )]
        );
    }

    #[test]
    fn header_only_block_falls_back_to_literal_lines() {
        let input = raw("| A | B |\n|---|---|");
        assert_eq!(extract(input.clone()), input);
    }

    #[test]
    fn body_rows_match_header_arity() {
        let out = extract(raw("| A | B | C |\n| 1 |\n| 1 | 2 | 3 | 4 |"));
        let Piece::Block(html) = &out[0] else {
            panic!("expected a table block, got {out:?}");
        };
        assert!(html.contains("<tr><td>1</td><td></td><td></td></tr>"));
        assert!(html.contains("<tr><td>1</td><td>2</td><td>3</td></tr>"));
    }

    #[test]
    fn line_break_marker_is_kept_inside_cell() {
        let out = extract(raw("| k | v |\n| a<br>b | c |"));
        let Piece::Block(html) = &out[0] else {
            panic!("expected a table block");
        };
        assert!(html.contains("<td>a<br>b</td>"), "{html}");
    }

    #[test]
    fn cell_text_is_escaped_and_inline_formatted() {
        let out = extract(raw("| name | note |\n| **x** | a < b \\| c |"));
        let Piece::Block(html) = &out[0] else {
            panic!("expected a table block");
        };
        assert!(html.contains("<td><strong>x</strong></td>"), "{html}");
        assert!(html.contains("<td>a &lt; b | c</td>"), "{html}");
    }

    #[test]
    fn pipes_inside_code_spans_stay_in_the_cell() {
        let out = extract(raw("| op | expr |\n|---|---|\n| or | `a || b` |"));
        let Piece::Block(html) = &out[0] else {
            panic!("expected a table block");
        };
        assert!(
            html.contains("<tr><td>or</td><td><code>a || b</code></td></tr>"),
            "{html}"
        );
    }

    #[test]
    fn unclosed_backtick_does_not_swallow_the_row() {
        assert_eq!(split_row("| `a | b |").len(), 2);
    }

    #[test]
    fn separator_sets_alignment() {
        let out = extract(raw("| l | c | r |\n|:--|:-:|--:|\n| 1 | 2 | 3 |"));
        let Piece::Block(html) = &out[0] else {
            panic!("expected a table block");
        };
        assert!(html.contains("<th style=\"text-align:left\">l</th>"));
        assert!(html.contains("<td style=\"text-align:center\">2</td>"));
        assert!(html.contains("<td style=\"text-align:right\">3</td>"));
    }

    #[test]
    fn text_between_tables_splits_blocks() {
        let out = extract(raw("| a |\n| 1 |\nmiddle\n| b |\n| 2 |"));
        assert_eq!(out.len(), 3);
        assert_eq!(out[1], Piece::Raw("middle".to_string()));
    }
}
