//! Debounced painting of the accumulated answer.

use crate::gate::CancellationGate;
use askflow_format::ContentFormatter;
use std::time::Duration;
use tokio::time::Instant;
use tracing::trace;

/// Minimum spacing between the starts of two renders.
pub const DEFAULT_RENDER_INTERVAL: Duration = Duration::from_millis(100);

/// Something that can display rendered markup.
pub trait ContentTarget {
    fn paint(&mut self, markup: &str);
}

/// Limits how often the formatter runs while text is streaming in.
///
/// At most one value waits in the pending slot; a newer schedule call
/// overwrites it, so only the latest text is ever rendered. Once the gate
/// is stopped nothing is painted again.
pub struct RenderCoalescer<'a> {
    target: &'a mut dyn ContentTarget,
    formatter: &'a mut ContentFormatter,
    gate: CancellationGate,
    interval: Duration,
    last_render_start: Option<Instant>,
    pending: Option<String>,
    rendered: Option<String>,
    paints: usize,
}

impl<'a> RenderCoalescer<'a> {
    pub fn new(
        target: &'a mut dyn ContentTarget,
        formatter: &'a mut ContentFormatter,
        gate: CancellationGate,
    ) -> Self {
        Self {
            target,
            formatter,
            gate,
            interval: DEFAULT_RENDER_INTERVAL,
            last_render_start: None,
            pending: None,
            rendered: None,
            paints: 0,
        }
    }

    #[must_use]
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Offer the latest accumulated text. Renders right away when the
    /// interval has elapsed, otherwise parks it in the pending slot.
    pub fn schedule(&mut self, text: &str) {
        if self.gate.is_stopped() || text.is_empty() {
            return;
        }
        if self.pending.is_none() && self.rendered.as_deref() == Some(text) {
            return;
        }

        let now = Instant::now();
        if self.within_interval(now) {
            trace!(len = text.len(), "render deferred");
            self.pending = Some(text.to_string());
            return;
        }
        self.pending = None;
        self.render(text, now);
    }

    /// When the pending value becomes due, if there is one.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref()?;
        Some(
            self.last_render_start
                .map_or_else(Instant::now, |start| start + self.interval),
        )
    }

    /// Render the pending value if its deadline has passed.
    pub fn flush_due(&mut self) {
        if self.gate.is_stopped() {
            self.pending = None;
            return;
        }
        let now = Instant::now();
        if self.pending.is_none() || self.within_interval(now) {
            return;
        }
        if let Some(text) = self.pending.take() {
            self.render(&text, now);
        }
    }

    /// Final render of the complete text, ignoring the interval.
    ///
    /// Returns whether anything was painted.
    pub fn finish(&mut self, text: &str) -> bool {
        self.pending = None;
        if self.gate.is_stopped() || text.is_empty() {
            return false;
        }
        self.render(text, Instant::now())
    }

    /// Raw text behind the markup currently on screen.
    #[must_use]
    pub fn rendered_text(&self) -> Option<&str> {
        self.rendered.as_deref()
    }

    #[must_use]
    pub const fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Number of paints so far.
    #[must_use]
    pub const fn paints(&self) -> usize {
        self.paints
    }

    fn within_interval(&self, now: Instant) -> bool {
        self.last_render_start
            .is_some_and(|start| now.duration_since(start) < self.interval)
    }

    fn render(&mut self, text: &str, now: Instant) -> bool {
        if self.gate.is_stopped() {
            return false;
        }
        self.last_render_start = Some(now);
        let markup = self.formatter.format(text);
        // Stop may land while formatting on another thread.
        if self.gate.is_stopped() {
            return false;
        }
        self.target.paint(&markup);
        self.rendered = Some(text.to_string());
        self.paints += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Screen {
        frames: Vec<String>,
    }

    impl ContentTarget for Screen {
        fn paint(&mut self, markup: &str) {
            self.frames.push(markup.to_string());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn first_schedule_renders_immediately() {
        let mut screen = Screen::default();
        let mut formatter = ContentFormatter::new();
        let mut coalescer = RenderCoalescer::new(&mut screen, &mut formatter, CancellationGate::new());

        coalescer.schedule("Hel");
        assert_eq!(coalescer.paints(), 1);
        assert!(!coalescer.has_pending());
        drop(coalescer);
        assert_eq!(screen.frames, vec!["<pre class=\"plain-answer\">Hel</pre>"]);
    }

    #[tokio::test(start_paused = true)]
    async fn latest_value_wins_inside_the_interval() {
        let mut screen = Screen::default();
        let mut formatter = ContentFormatter::new();
        let mut coalescer = RenderCoalescer::new(&mut screen, &mut formatter, CancellationGate::new());

        coalescer.schedule("a");
        coalescer.schedule("ab");
        coalescer.schedule("abc");
        assert_eq!(coalescer.paints(), 1);
        assert!(coalescer.has_pending());

        tokio::time::advance(Duration::from_millis(100)).await;
        coalescer.flush_due();
        assert_eq!(coalescer.paints(), 2);
        assert_eq!(coalescer.rendered_text(), Some("abc"));
        drop(coalescer);
        assert_eq!(screen.frames.len(), 2);
        assert!(screen.frames[1].contains("abc"));
    }

    #[tokio::test(start_paused = true)]
    async fn flush_waits_for_the_deadline() {
        let mut screen = Screen::default();
        let mut formatter = ContentFormatter::new();
        let mut coalescer = RenderCoalescer::new(&mut screen, &mut formatter, CancellationGate::new());

        coalescer.schedule("a");
        let started = Instant::now();
        coalescer.schedule("ab");
        assert_eq!(coalescer.deadline(), Some(started + DEFAULT_RENDER_INTERVAL));

        tokio::time::advance(Duration::from_millis(40)).await;
        coalescer.flush_due();
        assert_eq!(coalescer.paints(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn finish_bypasses_the_interval() {
        let mut screen = Screen::default();
        let mut formatter = ContentFormatter::new();
        let mut coalescer = RenderCoalescer::new(&mut screen, &mut formatter, CancellationGate::new());

        coalescer.schedule("Hel");
        coalescer.schedule("Hello");
        assert!(coalescer.finish("Hello"));
        assert!(!coalescer.has_pending());
        assert_eq!(coalescer.rendered_text(), Some("Hello"));
    }

    #[tokio::test(start_paused = true)]
    async fn nothing_paints_after_stop() {
        let mut screen = Screen::default();
        let mut formatter = ContentFormatter::new();
        let gate = CancellationGate::new();
        let mut coalescer = RenderCoalescer::new(&mut screen, &mut formatter, gate.clone());

        coalescer.schedule("a");
        coalescer.schedule("ab");
        gate.stop();
        tokio::time::advance(Duration::from_secs(1)).await;
        coalescer.flush_due();
        coalescer.schedule("abc");
        assert!(!coalescer.finish("abcd"));
        assert_eq!(coalescer.rendered_text(), Some("a"));
        drop(coalescer);
        assert_eq!(screen.frames.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_and_repeated_text_are_ignored() {
        let mut screen = Screen::default();
        let mut formatter = ContentFormatter::new();
        let mut coalescer = RenderCoalescer::new(&mut screen, &mut formatter, CancellationGate::new())
            .with_interval(Duration::ZERO);

        coalescer.schedule("");
        coalescer.schedule("same");
        coalescer.schedule("same");
        assert_eq!(coalescer.paints(), 1);
        assert!(!coalescer.finish(""));
    }
}
