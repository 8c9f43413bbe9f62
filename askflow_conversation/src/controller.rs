//! One ask at a time: retrieval, generation, streaming render, bookkeeping.

use crate::container::Container;
use crate::history::build_system_prompt;
use crate::state::ConversationState;
use askflow_core::{
    AskError, ConfigProvider, ContainerId, ErrorCategory, Generation, GenerationRequest,
    GenerationService, KnowledgeItem, KnowledgeMatch, RenderSink, RetrievalService, Selection,
    ServiceError, StreamError, Turn, TurnStore,
};
use askflow_format::{ContentFormatter, Tip};
use askflow_stream::{
    CancellationGate, DEFAULT_RENDER_INTERVAL, IngestOutcome, RenderCoalescer, StreamIngestor,
};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, info, warn};

type ContainerHook = Box<dyn FnMut(&Container) + Send>;

/// Stops whichever ask is in flight; clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    current: Arc<Mutex<Option<CancellationGate>>>,
}

impl StopHandle {
    /// Returns whether an ask was running.
    pub fn stop(&self) -> bool {
        let slot = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        slot.as_ref().is_some_and(|gate| {
            gate.stop();
            true
        })
    }

    fn arm(&self, gate: CancellationGate) {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = Some(gate);
    }

    fn disarm(&self) {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

/// Matched knowledge for the turn in progress.
struct Grounding {
    knowledge_base_id: String,
    items: Vec<KnowledgeItem>,
}

enum Branch {
    Grounded(Grounding),
    Direct,
    Finished(String),
}

/// Drives ask operations against the generation and retrieval services.
pub struct SessionController<G = Arc<dyn GenerationService>, R = Arc<dyn RetrievalService>>
where
    G: Send + Sync,
    R: Send + Sync,
{
    generation: G,
    retrieval: Option<R>,
    config: Arc<dyn ConfigProvider>,
    formatter: ContentFormatter,
    state: ConversationState,
    store: Option<Arc<dyn TurnStore>>,
    on_container_created: Option<ContainerHook>,
    stop: StopHandle,
    render_interval: Duration,
}

impl<G, R> SessionController<G, R>
where
    G: GenerationService + Send + Sync,
    R: RetrievalService + Send + Sync,
{
    pub fn new(
        generation: G,
        retrieval: Option<R>,
        config: Arc<dyn ConfigProvider>,
        sink: Arc<dyn RenderSink>,
    ) -> Self {
        info!("Creating session controller");
        Self {
            generation,
            retrieval,
            config,
            formatter: ContentFormatter::new(),
            state: ConversationState::new(sink),
            store: None,
            on_container_created: None,
            stop: StopHandle::default(),
            render_interval: DEFAULT_RENDER_INTERVAL,
        }
    }

    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn TurnStore>) -> Self {
        self.store = Some(store);
        self
    }

    #[must_use]
    pub const fn with_render_interval(mut self, interval: Duration) -> Self {
        self.render_interval = interval;
        self
    }

    /// Called for every container created after the default one.
    pub fn on_container_created(&mut self, hook: impl FnMut(&Container) + Send + 'static) {
        self.on_container_created = Some(Box::new(hook));
    }

    #[must_use]
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn stop(&self) -> bool {
        self.stop.stop()
    }

    #[must_use]
    pub const fn state(&self) -> &ConversationState {
        &self.state
    }

    pub fn container_mut(&mut self, id: ContainerId) -> Option<&mut Container> {
        self.state.container_by_id_mut(id)
    }

    pub fn last_container_mut(&mut self) -> Option<&mut Container> {
        self.state.last_container_mut()
    }

    /// Start over: no turns, no history, one fresh default container.
    pub fn clear(&mut self) {
        self.state.clear();
        self.formatter.clear_cache();
    }

    /// Answer one question, painting into a container as text arrives.
    ///
    /// A user stop is not an error: the text already on screen is returned.
    pub async fn ask(&mut self, question: &str) -> Result<String, AskError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AskError::EmptyQuestion);
        }

        let gate = CancellationGate::new();
        self.stop.arm(gate.clone());
        let result = self.run_turn(question, &gate).await;
        self.stop.disarm();
        result
    }

    async fn run_turn(
        &mut self,
        question: &str,
        gate: &CancellationGate,
    ) -> Result<String, AskError> {
        let selection = self.config.selection();
        let slot = self.state.begin_turn();
        if slot.created {
            if let (Some(hook), Some(container)) = (
                self.on_container_created.as_mut(),
                self.state.container(slot.index),
            ) {
                hook(container);
            }
        }
        info!(
            model = %selection.model,
            knowledge_base = ?selection.knowledge_base_id,
            "ask started"
        );

        let grounding = match self.retrieve(slot.index, question, &selection, gate).await? {
            Branch::Finished(text) => return Ok(text),
            Branch::Grounded(grounding) => Some(grounding),
            Branch::Direct => None,
        };

        let preamble = build_system_prompt(
            &selection.system_prompt,
            grounding.as_ref().map_or(&[][..], |g| g.items.as_slice()),
        );
        let request = GenerationRequest {
            model: selection.model.clone(),
            messages: self
                .state
                .history()
                .build_llm_messages(&preamble, question),
            temperature: selection.temperature,
            max_tokens: selection.max_tokens,
            stream: selection.stream,
        };

        self.tip(slot.index, Tip::Generating);
        let generated = tokio::select! {
            biased;
            () = gate.aborted() => None,
            result = self.generation.generate(&request) => Some(result),
        };
        let generation = match generated {
            None => return Ok(self.stopped(slot.index, question, "", grounding)),
            Some(Err(e)) => {
                warn!("generation failed: {e}");
                self.fail(slot.index, e.category, "");
                return Err(AskError::Generation(e));
            }
            Some(Ok(generation)) => generation,
        };

        let (outcome, shown) = self.render(slot.index, generation, gate).await;
        match outcome {
            Err(e) => {
                warn!("stream failed: {e}");
                self.fail(slot.index, e.category(), &shown);
                Err(AskError::Transport(e))
            }
            Ok(outcome) if outcome.stopped => {
                Ok(self.stopped(slot.index, question, &outcome.text, grounding))
            }
            Ok(outcome) => Ok(self
                .complete(slot.index, question, outcome.text, grounding)
                .await),
        }
    }

    /// Knowledge-base branch: search first, and end the turn early when
    /// nothing matched.
    async fn retrieve(
        &mut self,
        index: usize,
        question: &str,
        selection: &Selection,
        gate: &CancellationGate,
    ) -> Result<Branch, AskError> {
        let Some(kb) = selection.knowledge_base_id.as_deref() else {
            return Ok(Branch::Direct);
        };
        let Some(retrieval) = self.retrieval.as_ref() else {
            let err = ServiceError::new(
                ErrorCategory::NotFound,
                "a knowledge base is selected but no retrieval service is configured",
            );
            self.fail(index, err.category, "");
            return Err(AskError::Retrieval(err));
        };

        if let Some(container) = self.state.container_mut(index) {
            container.show_tip(Tip::Searching);
        }
        let retrieved = tokio::select! {
            biased;
            () = gate.aborted() => None,
            result = retrieval.retrieve(question, Some(kb)) => Some(result),
        };

        let outcome = match retrieved {
            None => return Ok(Branch::Finished(self.stopped(index, question, "", None))),
            Some(Err(e)) => {
                warn!("retrieval failed: {e}");
                self.fail(index, e.category, "");
                return Err(AskError::Retrieval(e));
            }
            Some(Ok(outcome)) => outcome,
        };
        info!(status = outcome.status, matches = outcome.match_count(), "retrieval complete");

        if outcome.items.is_empty() {
            self.tip(index, Tip::NoMatch);
            self.finalize(index, "");
            let knowledge = KnowledgeMatch {
                knowledge_base_id: kb.to_string(),
                match_count: 0,
            };
            self.record(Turn::new(question, "", Some(knowledge)), false)
                .await;
            return Ok(Branch::Finished(String::new()));
        }

        Ok(Branch::Grounded(Grounding {
            knowledge_base_id: kb.to_string(),
            items: outcome.items,
        }))
    }

    /// Paint the answer into the container. Also returns the text on
    /// screen, which is all that is left when the stream fails midway.
    async fn render(
        &mut self,
        index: usize,
        generation: Generation,
        gate: &CancellationGate,
    ) -> (Result<IngestOutcome, StreamError>, String) {
        let Some(container) = self.state.container_mut(index) else {
            let missing = StreamError::Transport("container missing".to_string());
            return (Err(missing), String::new());
        };
        let mut coalescer = RenderCoalescer::new(container, &mut self.formatter, gate.clone())
            .with_interval(self.render_interval);

        let outcome = match generation {
            Generation::Stream(chunks) => {
                StreamIngestor::new()
                    .ingest(chunks, &mut coalescer, gate)
                    .await
            }
            Generation::Complete(value) => {
                debug!("rendering non-streaming response");
                Ok(StreamIngestor::ingest_complete(&value, &mut coalescer, gate))
            }
        };
        let shown = coalescer.rendered_text().unwrap_or_default().to_string();
        (outcome, shown)
    }

    async fn complete(
        &mut self,
        index: usize,
        question: &str,
        answer: String,
        grounding: Option<Grounding>,
    ) -> String {
        let knowledge = grounding.map(|g| {
            let knowledge = KnowledgeMatch {
                knowledge_base_id: g.knowledge_base_id,
                match_count: g.items.len(),
            };
            if let Some(container) = self.state.container_mut(index) {
                container.set_knowledge_items(g.items);
            }
            knowledge
        });
        if let Some(container) = self.state.container_mut(index) {
            container.clear_tips();
        }
        self.finalize(index, &answer);
        self.record(Turn::new(question, &answer, knowledge), true)
            .await;
        answer
    }

    /// Leave the partial answer on screen and say so; nothing else moves.
    fn stopped(
        &mut self,
        index: usize,
        question: &str,
        shown: &str,
        grounding: Option<Grounding>,
    ) -> String {
        info!(len = shown.len(), "ask stopped by user");
        self.tip(index, Tip::Stopped);
        self.finalize(index, shown);
        let knowledge = grounding.map(|g| KnowledgeMatch {
            knowledge_base_id: g.knowledge_base_id,
            match_count: g.items.len(),
        });
        self.state
            .record_turn(Turn::new(question, shown, knowledge), false);
        shown.to_string()
    }

    /// The error tip replaces whatever tip was showing; partial content stays.
    fn fail(&mut self, index: usize, category: ErrorCategory, shown: &str) {
        self.tip(index, Tip::Error(category));
        self.finalize(index, shown);
    }

    fn tip(&mut self, index: usize, tip: Tip) {
        if let Some(container) = self.state.container_mut(index) {
            container.show_tip(tip);
        }
    }

    fn finalize(&mut self, index: usize, answer: &str) {
        if let Some(container) = self.state.container_mut(index) {
            container.finalize(answer);
        }
        self.state.finish_active();
    }

    async fn record(&mut self, turn: Turn, into_history: bool) {
        if let Some(store) = &self.store {
            if let Err(e) = store.record(&turn).await {
                warn!("failed to persist turn: {e}");
            }
        }
        self.state.record_turn(turn, into_history);
    }
}
