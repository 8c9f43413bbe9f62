#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

pub mod error;
pub mod turn;

pub use error::{AskError, ErrorCategory, ServiceError, StreamError};
pub use turn::{KnowledgeMatch, TURN_TEXT_LIMIT, Turn, truncate_chars};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// One snippet returned by the retrieval service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KnowledgeItem {
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

/// Ordered snippets plus the status reported by the retrieval service.
#[derive(Debug, Clone, Default)]
pub struct RetrievalOutcome {
    pub status: u16,
    pub items: Vec<KnowledgeItem>,
}

impl RetrievalOutcome {
    #[must_use]
    pub fn match_count(&self) -> usize {
        self.items.len()
    }
}

/// Everything the generation service needs for one call.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: usize,
    pub stream: bool,
}

/// Raw network chunks of a streamed answer.
pub type ChunkStream = BoxStream<'static, anyhow::Result<Vec<u8>>>;

/// What the generation service handed back.
pub enum Generation {
    /// Line-framed chunks still arriving from the network.
    Stream(ChunkStream),
    /// A single JSON body (non-streaming fallback).
    Complete(serde_json::Value),
}

impl std::fmt::Debug for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stream(_) => f.write_str("Generation::Stream(..)"),
            Self::Complete(v) => f.debug_tuple("Generation::Complete").field(v).finish(),
        }
    }
}

#[async_trait]
pub trait GenerationService: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<Generation, ServiceError>;
}

#[async_trait]
pub trait RetrievalService: Send + Sync {
    async fn retrieve(
        &self,
        question: &str,
        dataset_id: Option<&str>,
    ) -> Result<RetrievalOutcome, ServiceError>;
}

#[async_trait]
impl<T: GenerationService + ?Sized> GenerationService for Arc<T> {
    async fn generate(&self, request: &GenerationRequest) -> Result<Generation, ServiceError> {
        (**self).generate(request).await
    }
}

#[async_trait]
impl<T: RetrievalService + ?Sized> RetrievalService for Arc<T> {
    async fn retrieve(
        &self,
        question: &str,
        dataset_id: Option<&str>,
    ) -> Result<RetrievalOutcome, ServiceError> {
        (**self).retrieve(question, dataset_id).await
    }
}

/// Model, knowledge base and sampling parameters for the next ask.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub model: String,
    pub knowledge_base_id: Option<String>,
    pub system_prompt: String,
    pub temperature: f32,
    pub max_tokens: usize,
    pub stream: bool,
}

/// Read-only access to the user's current selection.
pub trait ConfigProvider: Send + Sync {
    fn selection(&self) -> Selection;
}

impl ConfigProvider for Selection {
    fn selection(&self) -> Selection {
        self.clone()
    }
}

/// Identifies one container's render targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContainerId(pub Uuid);

impl ContainerId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for ContainerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ContainerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Presentation surface the core paints into. All arguments are markup.
pub trait RenderSink: Send + Sync {
    fn set_tips(&self, container: ContainerId, markup: &str);
    fn set_content(&self, container: ContainerId, markup: &str);
    fn set_references(&self, container: ContainerId, markup: &str);
}

/// Persistence for finalized turns.
#[async_trait]
pub trait TurnStore: Send + Sync {
    async fn record(&self, turn: &Turn) -> anyhow::Result<()>;
}
