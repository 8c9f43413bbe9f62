//! Fenced code blocks.
//!
//! Runs first so nothing inside a fence is ever read as a table, heading or
//! emphasis. A fence that is still open when the text ends (a streaming
//! answer cut mid-block) extends to the end of the text.

use crate::escape::escape_html;
use crate::piece::Piece;

const FENCE: &str = "```";

pub fn extract(pieces: Vec<Piece>) -> Vec<Piece> {
    let mut out = Vec::with_capacity(pieces.len());
    let mut open: Option<(String, Vec<String>)> = None;

    for piece in pieces {
        let line = match piece {
            Piece::Raw(line) => line,
            other => {
                if let Some((lang, body)) = open.take() {
                    out.push(Piece::Block(code_block(&lang, &body)));
                }
                out.push(other);
                continue;
            }
        };

        let trimmed = line.trim_start();
        match open.as_mut() {
            Some((lang, body)) => {
                if trimmed.starts_with(FENCE) {
                    out.push(Piece::Block(code_block(lang, body)));
                    open = None;
                } else {
                    body.push(line);
                }
            }
            None => {
                if let Some(info) = trimmed.strip_prefix(FENCE) {
                    let lang = info.trim().split_whitespace().next().unwrap_or_default();
                    open = Some((lang.to_string(), Vec::new()));
                } else {
                    out.push(Piece::Raw(line));
                }
            }
        }
    }

    if let Some((lang, body)) = open {
        out.push(Piece::Block(code_block(&lang, &body)));
    }
    out
}

fn code_block(lang: &str, body: &[String]) -> String {
    let code = escape_html(&body.join("\n"));
    if lang.is_empty() {
        format!("<pre><code>{code}</code></pre>")
    } else {
        format!(
            "<pre><code class=\"language-{}\">{code}</code></pre>",
            escape_html(lang)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(text: &str) -> Vec<Piece> {
        text.lines().map(|l| Piece::Raw(l.to_string())).collect()
    }

    #[test]
    fn extracts_closed_fence_with_language() {
        let out = extract(raw("before\n```rust\nlet x = 1 < 2;\n```\nafter"));
        assert_eq!(
            out,
            vec![
                Piece::Raw("before".to_string()),
                Piece::Block(
                    "<pre><code class=\"language-rust\">let x = 1 &lt; 2;</code></pre>".to_string()
                ),
                Piece::Raw("after".to_string()),
            ]
        );
    }

    #[test]
    fn unterminated_fence_runs_to_end() {
        let out = extract(raw("```\n| a | b |\n**not bold**"));
        assert_eq!(
            out,
            vec![Piece::Block(
                "<pre><code>| a | b |\n**not bold**</code></pre>".to_string()
            )]
        );
    }

    #[test]
    fn preserves_indentation_inside_fence() {
        let out = extract(raw("```py\ndef f():\n    return 1\n```"));
        assert_eq!(
            out,
            vec![Piece::Block(
                "<pre><code class=\"language-py\">def f():\n    return 1</code></pre>".to_string()
            )]
        );
    }
}
