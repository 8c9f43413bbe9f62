//! Static strategy pattern for CLI commands.
//!
//! Each command is a separate strategy type with its own input, dispatched
//! statically from `main`.

use crate::sink::ConsoleSink;
use crate::store::JsonlTurnStore;
use askflow_config::{Config, Overrides};
use askflow_conversation::{SessionController, StopHandle};
use askflow_core::{GenerationService, RetrievalService};
use askflow_providers::{HttpRetrievalProvider, OpenAiCompatProvider};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

mod ask;
mod chat;
mod info;
mod init;
mod version;

pub use ask::{AskInput, AskStrategy};
pub use chat::{ChatInput, ChatStrategy};
pub use info::InfoStrategy;
pub use init::InitStrategy;
pub use version::VersionStrategy;

/// Core trait defining the contract for all command strategies.
pub trait CommandStrategy: Send + Sync + 'static {
    /// The input type this strategy accepts.
    type Input;

    /// Execute the command with the given input.
    async fn execute(&self, input: Self::Input) -> anyhow::Result<()>;
}

const HISTORY_FILE: &str = "history.jsonl";

pub fn history_path() -> anyhow::Result<PathBuf> {
    Ok(Config::config_dir()?.join(HISTORY_FILE))
}

/// Everything an ask-style command needs.
struct Session {
    controller: SessionController,
    sink: Arc<ConsoleSink>,
}

/// Load config, apply CLI overrides and wire providers into a controller.
fn build_session(overrides: Overrides) -> anyhow::Result<Session> {
    let config = Config::load()?.with_overrides(overrides);
    config.validate()?;
    info!("Loaded config from {}", Config::config_path()?.display());

    let generation_config = &config.providers.generation;
    let generation: Arc<dyn GenerationService> = Arc::new(
        OpenAiCompatProvider::new(generation_config.api_key.clone())
            .with_base_url(generation_config.base_url.clone()),
    );
    let retrieval = config.providers.retrieval.as_ref().map(|r| {
        Arc::new(
            HttpRetrievalProvider::new(r.api_key.clone(), r.base_url.clone())
                .with_top_k(r.top_k)
                .with_similarity_threshold(r.similarity_threshold),
        ) as Arc<dyn RetrievalService>
    });

    Config::ensure_config_dir()?;
    let store = JsonlTurnStore::new(history_path()?);
    debug!("Recording turns to {}", store.path().display());

    let sink = Arc::new(ConsoleSink::new());
    let interval = config.render_interval();
    let controller = SessionController::new(generation, retrieval, Arc::new(config), sink.clone())
        .with_store(Arc::new(store))
        .with_render_interval(interval);

    Ok(Session { controller, sink })
}

/// First Ctrl+C stops the answer in flight; at a prompt it exits.
fn spawn_interrupt_handler(handle: StopHandle) {
    tokio::spawn(async move {
        loop {
            if tokio::signal::ctrl_c().await.is_err() {
                return;
            }
            if !handle.stop() {
                eprintln!();
                std::process::exit(130);
            }
        }
    });
}
