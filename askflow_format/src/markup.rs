//! Markup for the tip and reference areas of a container.

use askflow_core::{ErrorCategory, KnowledgeItem};

use crate::escape::escape_html;

/// Status line shown above an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tip {
    Searching,
    Generating,
    NoMatch,
    Stopped,
    Error(ErrorCategory),
}

impl Tip {
    const fn class(self) -> &'static str {
        match self {
            Self::Searching | Self::Generating => "tip-progress",
            Self::NoMatch => "tip-no-match",
            Self::Stopped => "tip-stopped",
            Self::Error(_) => "tip-error",
        }
    }

    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Searching => "Searching the knowledge base…",
            Self::Generating => "Generating an answer…",
            Self::NoMatch => {
                "No matching content was found in the knowledge base. Try rephrasing the question or selecting another knowledge base."
            }
            Self::Stopped => "Answer stopped.",
            Self::Error(category) => category.user_message(),
        }
    }
}

#[must_use]
pub fn tip_markup(tip: Tip) -> String {
    format!(
        "<div class=\"tip {}\">{}</div>",
        tip.class(),
        escape_html(tip.message())
    )
}

/// Expandable list of the snippets an answer was grounded on.
///
/// Empty input yields empty markup so the reference area is cleared.
#[must_use]
pub fn references_markup(items: &[KnowledgeItem]) -> String {
    if items.is_empty() {
        return String::new();
    }
    let mut html = format!(
        "<details class=\"references\"><summary>References ({})</summary><ol>",
        items.len()
    );
    for item in items {
        html.push_str("<li><strong>");
        html.push_str(&escape_html(&item.title));
        html.push_str("</strong>");
        if let Some(score) = item.score {
            html.push_str(&format!(" <span class=\"score\">{score:.2}</span>"));
        }
        html.push_str("<div class=\"snippet\">");
        html.push_str(&escape_html(&item.content));
        html.push_str("</div></li>");
    }
    html.push_str("</ol></details>");
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_tip_uses_category_message() {
        let html = tip_markup(Tip::Error(ErrorCategory::Auth));
        assert!(html.starts_with("<div class=\"tip tip-error\">"));
        assert!(html.contains("Authentication failed"));
    }

    #[test]
    fn references_are_escaped_and_scored() {
        let html = references_markup(&[KnowledgeItem {
            title: "<Runbook>".to_string(),
            content: "step 1 & 2".to_string(),
            score: Some(0.876),
        }]);
        assert!(html.contains("References (1)"));
        assert!(html.contains("<strong>&lt;Runbook&gt;</strong>"));
        assert!(html.contains("<span class=\"score\">0.88</span>"));
        assert!(html.contains("step 1 &amp; 2"));
    }

    #[test]
    fn no_references_clears_area() {
        assert_eq!(references_markup(&[]), "");
    }
}
