//! Render targets and feedback state for one question/answer exchange.

use askflow_core::{ContainerId, KnowledgeItem, RenderSink};
use askflow_format::{Tip, references_markup, tip_markup};
use askflow_stream::ContentTarget;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Feedback {
    #[default]
    None,
    Liked,
    Disliked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContainerState {
    #[default]
    Idle,
    Active,
    Finalized,
}

/// Three render targets (tips, content, references) plus the answer and
/// snippets behind them. Every target update is mirrored to the sink.
pub struct Container {
    id: ContainerId,
    sink: Arc<dyn RenderSink>,
    tips: String,
    content: String,
    references: String,
    rendered_text: String,
    feedback: Feedback,
    knowledge_items: Vec<KnowledgeItem>,
    state: ContainerState,
}

impl Container {
    pub fn new(sink: Arc<dyn RenderSink>) -> Self {
        Self {
            id: ContainerId::new(),
            sink,
            tips: String::new(),
            content: String::new(),
            references: String::new(),
            rendered_text: String::new(),
            feedback: Feedback::None,
            knowledge_items: Vec::new(),
            state: ContainerState::Idle,
        }
    }

    #[must_use]
    pub const fn id(&self) -> ContainerId {
        self.id
    }

    #[must_use]
    pub const fn state(&self) -> ContainerState {
        self.state
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == ContainerState::Active
    }

    pub fn activate(&mut self) {
        debug!(container = %self.id, "container activated");
        self.state = ContainerState::Active;
    }

    /// Close the container; `answer` is the text now on screen.
    pub fn finalize(&mut self, answer: &str) {
        if self.state == ContainerState::Finalized {
            return;
        }
        answer.clone_into(&mut self.rendered_text);
        self.state = ContainerState::Finalized;
        debug!(container = %self.id, len = answer.len(), "container finalized");
    }

    pub fn show_tip(&mut self, tip: Tip) {
        self.set_tips(tip_markup(tip));
    }

    pub fn clear_tips(&mut self) {
        self.set_tips(String::new());
    }

    fn set_tips(&mut self, markup: String) {
        self.sink.set_tips(self.id, &markup);
        self.tips = markup;
    }

    /// Keep the snippets and show them as the reference list.
    pub fn set_knowledge_items(&mut self, items: Vec<KnowledgeItem>) {
        let markup = references_markup(&items);
        self.sink.set_references(self.id, &markup);
        self.references = markup;
        self.knowledge_items = items;
    }

    /// Raw answer text once the container is finalized.
    #[must_use]
    pub fn rendered_text(&self) -> &str {
        &self.rendered_text
    }

    #[must_use]
    pub fn knowledge_items(&self) -> &[KnowledgeItem] {
        &self.knowledge_items
    }

    #[must_use]
    pub fn tips(&self) -> &str {
        &self.tips
    }

    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    #[must_use]
    pub fn references(&self) -> &str {
        &self.references
    }

    #[must_use]
    pub const fn feedback(&self) -> Feedback {
        self.feedback
    }

    /// Toggle a like. Returns `false` if the answer is not finished yet.
    pub fn like(&mut self) -> bool {
        self.toggle(Feedback::Liked)
    }

    pub fn dislike(&mut self) -> bool {
        self.toggle(Feedback::Disliked)
    }

    fn toggle(&mut self, choice: Feedback) -> bool {
        if self.state != ContainerState::Finalized {
            return false;
        }
        self.feedback = if self.feedback == choice {
            Feedback::None
        } else {
            choice
        };
        debug!(container = %self.id, feedback = ?self.feedback, "feedback changed");
        true
    }
}

impl ContentTarget for Container {
    fn paint(&mut self, markup: &str) {
        self.sink.set_content(self.id, markup);
        markup.clone_into(&mut self.content);
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("feedback", &self.feedback)
            .field("knowledge_items", &self.knowledge_items.len())
            .finish_non_exhaustive()
    }
}
