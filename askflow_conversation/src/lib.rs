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

//! Multi-turn question answering with incremental rendering.
//!
//! [`SessionController`] runs one ask at a time: an optional knowledge-base
//! search, a generation call, and a streamed render into a [`Container`].
//! [`ConversationState`] keeps the transcript, the rolling model context
//! and the containers.

mod container;
mod controller;
mod history;
mod state;

pub use container::{Container, ContainerState, Feedback};
pub use controller::{SessionController, StopHandle};
pub use history::{ConversationHistory, HISTORY_LIMIT, build_system_prompt};
pub use state::{ConversationState, TurnSlot};
