//! Completed question/answer exchanges.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum characters of a question or answer kept in a stored turn.
pub const TURN_TEXT_LIMIT: usize = 2000;

/// Knowledge-base bookkeeping for one turn.
///
/// Only exists when the turn ran against a knowledge base, so a match count
/// can never be recorded without the dataset it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeMatch {
    pub knowledge_base_id: String,
    pub match_count: usize,
}

/// One immutable question/answer exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub question: String,
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knowledge: Option<KnowledgeMatch>,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    /// Create a turn, truncating both texts to [`TURN_TEXT_LIMIT`].
    #[must_use]
    pub fn new(question: &str, answer: &str, knowledge: Option<KnowledgeMatch>) -> Self {
        Self {
            question: truncate_chars(question, TURN_TEXT_LIMIT),
            answer: truncate_chars(answer, TURN_TEXT_LIMIT),
            knowledge,
            timestamp: Utc::now(),
        }
    }

    #[must_use]
    pub fn knowledge_base_id(&self) -> Option<&str> {
        self.knowledge
            .as_ref()
            .map(|k| k.knowledge_base_id.as_str())
    }

    #[must_use]
    pub fn match_count(&self) -> Option<usize> {
        self.knowledge.as_ref().map(|k| k.match_count)
    }
}

/// Truncate to at most `limit` characters, appending an ellipsis when cut.
#[must_use]
pub fn truncate_chars(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((byte_idx, _)) => format!("{}…", &text[..byte_idx]),
        None => text.to_string(),
    }
}
