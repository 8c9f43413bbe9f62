use crate::container::{Container, ContainerState};
use crate::history::ConversationHistory;
use askflow_core::{ContainerId, RenderSink, Turn};
use std::sync::Arc;
use tracing::{debug, info};

/// Transcript, rolling history and containers of one session.
pub struct ConversationState {
    sink: Arc<dyn RenderSink>,
    turns: Vec<Turn>,
    history: ConversationHistory,
    containers: Vec<Container>,
    active: Option<usize>,
    default_used: bool,
}

/// The container picked for a new turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnSlot {
    pub index: usize,
    /// False when the default container was reused.
    pub created: bool,
}

impl ConversationState {
    pub fn new(sink: Arc<dyn RenderSink>) -> Self {
        let default = Container::new(Arc::clone(&sink));
        Self {
            sink,
            turns: Vec::new(),
            history: ConversationHistory::new(),
            containers: vec![default],
            active: None,
            default_used: false,
        }
    }

    /// Finalize whatever is still active and hand out the next container.
    pub fn begin_turn(&mut self) -> TurnSlot {
        self.finish_active();

        let slot = if self.default_used {
            self.containers
                .push(Container::new(Arc::clone(&self.sink)));
            TurnSlot {
                index: self.containers.len() - 1,
                created: true,
            }
        } else {
            self.default_used = true;
            TurnSlot {
                index: 0,
                created: false,
            }
        };

        self.containers[slot.index].activate();
        self.active = Some(slot.index);
        slot
    }

    /// Finalize the active container with whatever it already shows.
    pub fn finish_active(&mut self) {
        if let Some(index) = self.active.take() {
            let container = &mut self.containers[index];
            if container.state() == ContainerState::Active {
                let shown = container.rendered_text().to_string();
                container.finalize(&shown);
            }
        }
    }

    /// Append a finished turn to the transcript, and to the rolling
    /// history when it produced an answer worth remembering.
    pub fn record_turn(&mut self, turn: Turn, into_history: bool) {
        if into_history {
            self.history.push_turn(&turn.question, &turn.answer);
        }
        info!(
            turns = self.turns.len() + 1,
            history = self.history.len(),
            matches = ?turn.match_count(),
            "turn appended"
        );
        self.turns.push(turn);
    }

    #[must_use]
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    #[must_use]
    pub const fn history(&self) -> &ConversationHistory {
        &self.history
    }

    #[must_use]
    pub fn containers(&self) -> &[Container] {
        &self.containers
    }

    #[must_use]
    pub fn container(&self, index: usize) -> Option<&Container> {
        self.containers.get(index)
    }

    pub fn container_mut(&mut self, index: usize) -> Option<&mut Container> {
        self.containers.get_mut(index)
    }

    pub fn container_by_id_mut(&mut self, id: ContainerId) -> Option<&mut Container> {
        self.containers.iter_mut().find(|c| c.id() == id)
    }

    #[must_use]
    pub fn active_container(&self) -> Option<&Container> {
        self.active.and_then(|i| self.containers.get(i))
    }

    /// Most recent container that has been used for a turn.
    pub fn last_container_mut(&mut self) -> Option<&mut Container> {
        if !self.default_used {
            return None;
        }
        self.containers.last_mut()
    }

    /// Back to a fresh session with one unused default container.
    pub fn clear(&mut self) {
        self.turns.clear();
        self.history.clear();
        self.containers = vec![Container::new(Arc::clone(&self.sink))];
        self.active = None;
        self.default_used = false;
        debug!("conversation cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use askflow_core::KnowledgeMatch;

    struct NullSink;

    impl RenderSink for NullSink {
        fn set_tips(&self, _: ContainerId, _: &str) {}
        fn set_content(&self, _: ContainerId, _: &str) {}
        fn set_references(&self, _: ContainerId, _: &str) {}
    }

    fn state() -> ConversationState {
        ConversationState::new(Arc::new(NullSink))
    }

    #[test]
    fn default_container_serves_the_first_turn() {
        let mut state = state();
        let first_id = state.containers()[0].id();

        let slot = state.begin_turn();
        assert_eq!(slot, TurnSlot { index: 0, created: false });
        assert_eq!(state.active_container().map(Container::id), Some(first_id));

        let slot = state.begin_turn();
        assert!(slot.created);
        assert_eq!(state.containers().len(), 2);
        assert_eq!(state.containers()[0].state(), ContainerState::Finalized);
    }

    #[test]
    fn one_active_container_at_a_time() {
        let mut state = state();
        for _ in 0..3 {
            state.begin_turn();
        }
        let active = state.containers().iter().filter(|c| c.is_active()).count();
        assert_eq!(active, 1);
    }

    #[test]
    fn zero_match_turns_stay_out_of_history() {
        let mut state = state();
        let miss = KnowledgeMatch {
            knowledge_base_id: "kb".to_string(),
            match_count: 0,
        };
        state.record_turn(Turn::new("q", "", Some(miss)), false);
        state.record_turn(Turn::new("q2", "a2", None), true);

        assert_eq!(state.turns().len(), 2);
        assert_eq!(state.history().len(), 2);
    }

    #[test]
    fn clear_restores_a_fresh_default() {
        let mut state = state();
        state.begin_turn();
        state.begin_turn();
        state.record_turn(Turn::new("q", "a", None), true);
        assert!(state.last_container_mut().is_some());

        state.clear();
        assert!(state.turns().is_empty());
        assert!(state.history().is_empty());
        assert_eq!(state.containers().len(), 1);
        assert!(state.active_container().is_none());
        assert!(state.last_container_mut().is_none());
        assert!(!state.begin_turn().created);
    }
}
