//! Rolling conversation history used as model context.
//!
//! Only completed question/answer pairs are kept, so the window always
//! holds an even number of messages.

use askflow_core::{ChatMessage, KnowledgeItem};
use std::collections::VecDeque;
use tracing::debug;

/// Three turns.
pub const HISTORY_LIMIT: usize = 6;

/// A bounded window of user/assistant pairs, oldest evicted first.
#[derive(Debug, Clone)]
pub struct ConversationHistory {
    messages: VecDeque<ChatMessage>,
    max_messages: usize,
}

impl ConversationHistory {
    #[must_use]
    pub fn new() -> Self {
        Self {
            messages: VecDeque::with_capacity(HISTORY_LIMIT + 2),
            max_messages: HISTORY_LIMIT,
        }
    }

    /// Create with a specific message limit, rounded down to whole pairs.
    #[must_use]
    pub fn with_max_messages(mut self, max: usize) -> Self {
        self.max_messages = (max - max % 2).max(2);
        self
    }

    pub fn push_turn(&mut self, question: &str, answer: &str) {
        self.messages.push_back(ChatMessage::user(question));
        self.messages.push_back(ChatMessage::assistant(answer));
        while self.messages.len() > self.max_messages {
            self.messages.pop_front();
            self.messages.pop_front();
            debug!("evicted oldest history pair");
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// System preamble, then the window, then the new question.
    #[must_use]
    pub fn build_llm_messages(&self, system_prompt: &str, new_message: &str) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(self.messages.len() + 2);
        messages.push(ChatMessage::system(system_prompt));
        messages.extend(self.messages.iter().cloned());
        messages.push(ChatMessage::user(new_message));
        messages
    }
}

impl Default for ConversationHistory {
    fn default() -> Self {
        Self::new()
    }
}

/// Append retrieved snippets to the preamble as numbered context.
#[must_use]
pub fn build_system_prompt(preamble: &str, knowledge: &[KnowledgeItem]) -> String {
    if knowledge.is_empty() {
        return preamble.to_string();
    }
    let context = knowledge
        .iter()
        .enumerate()
        .map(|(i, item)| format!("[{}] {}\n{}", i + 1, item.title, item.content.trim()))
        .collect::<Vec<_>>()
        .join("\n\n");
    format!(
        "{preamble}\n\nAnswer using only the context below. If it does not cover the question, say so.\n\n# Relevant Context\n\n{context}"
    )
}
