//! Terminal presentation of containers.
//!
//! Markup is kept per container for `--html` export; the terminal only
//! gets tips as plain text and a progress trail while content streams.

use askflow_core::{ContainerId, RenderSink};
use std::collections::HashMap;
use std::io::Write;
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Default, Clone)]
struct Panel {
    tips: String,
    content: String,
    references: String,
    paints: usize,
}

#[derive(Debug, Default)]
pub struct ConsoleSink {
    panels: Mutex<HashMap<ContainerId, Panel>>,
}

impl ConsoleSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_panel<T>(&self, id: ContainerId, f: impl FnOnce(&mut Panel) -> T) -> T {
        let mut panels = self.panels.lock().unwrap_or_else(PoisonError::into_inner);
        f(panels.entry(id).or_default())
    }

    /// Standalone HTML page with everything the container shows.
    #[must_use]
    pub fn page(&self, id: ContainerId, question: &str) -> Option<String> {
        let panels = self.panels.lock().unwrap_or_else(PoisonError::into_inner);
        let panel = panels.get(&id)?;
        Some(format!(
            "<!doctype html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>askflow</title>\n<style>{PAGE_STYLE}</style>\n</head>\n<body>\n<section class=\"container\">\n<h1 class=\"question\">{}</h1>\n<div class=\"tips\">{}</div>\n<div class=\"content\">{}</div>\n<div class=\"references\">{}</div>\n</section>\n</body>\n</html>\n",
            askflow_format::escape_html(question),
            panel.tips,
            panel.content,
            panel.references,
        ))
    }
}

const PAGE_STYLE: &str = "body{font-family:sans-serif;max-width:52rem;margin:2rem auto;line-height:1.5}\
.md-table{border-collapse:collapse}.md-table td,.md-table th{border:1px solid #ccc;padding:.25rem .5rem}\
pre{background:#f6f8fa;padding:.75rem;overflow:auto}.tip{color:#555;font-style:italic}.tip-error{color:#b00}\
blockquote{border-left:3px solid #ccc;margin-left:0;padding-left:1rem;color:#444}";

impl RenderSink for ConsoleSink {
    fn set_tips(&self, container: ContainerId, markup: &str) {
        let had_progress = self.with_panel(container, |panel| {
            markup.clone_into(&mut panel.tips);
            std::mem::take(&mut panel.paints) > 0
        });
        let mut err = std::io::stderr().lock();
        if had_progress {
            let _ = writeln!(err);
        }
        let text = plain_text(markup);
        if !text.is_empty() {
            let _ = writeln!(err, "{text}");
        }
    }

    fn set_content(&self, container: ContainerId, markup: &str) {
        self.with_panel(container, |panel| {
            markup.clone_into(&mut panel.content);
            panel.paints += 1;
        });
        let mut err = std::io::stderr().lock();
        let _ = write!(err, ".");
        let _ = err.flush();
    }

    fn set_references(&self, container: ContainerId, markup: &str) {
        self.with_panel(container, |panel| markup.clone_into(&mut panel.references));
    }
}

/// Drop tags and decode the entities `escape_html` produces.
#[must_use]
pub fn plain_text(markup: &str) -> String {
    let mut out = String::with_capacity(markup.len());
    let mut in_tag = false;
    for c in markup.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use askflow_format::{Tip, tip_markup};

    #[test]
    fn tips_read_as_plain_text() {
        assert_eq!(plain_text(&tip_markup(Tip::Stopped)), "Answer stopped.");
        assert_eq!(plain_text("<p>a &amp;lt; b</p>"), "a &lt; b");
        assert_eq!(plain_text(""), "");
    }

    #[test]
    fn page_contains_all_targets() {
        let sink = ConsoleSink::new();
        let id = ContainerId::new();
        sink.set_content(id, "<p>answer</p>");
        sink.set_references(id, "<details>refs</details>");
        sink.set_tips(id, "");

        let page = sink.page(id, "why <now>?").unwrap();
        assert!(page.contains("<div class=\"content\"><p>answer</p></div>"));
        assert!(page.contains("<details>refs</details>"));
        assert!(page.contains("why &lt;now&gt;?"));
        assert!(sink.page(ContainerId::new(), "q").is_none());
    }
}
