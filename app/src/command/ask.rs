use askflow_config::Overrides;
use askflow_conversation::Container;
use std::path::PathBuf;
use tracing::info;

use super::{build_session, spawn_interrupt_handler};

/// Input parameters for the Ask command strategy.
#[derive(Debug, Clone)]
pub struct AskInput {
    pub question: String,
    pub overrides: Overrides,
    /// Write the rendered container to this file as an HTML page.
    pub html: Option<PathBuf>,
}

/// Strategy for answering a single question.
#[derive(Debug, Clone, Copy)]
pub struct AskStrategy;

impl super::CommandStrategy for AskStrategy {
    type Input = AskInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let mut session = build_session(input.overrides)?;
        spawn_interrupt_handler(session.controller.stop_handle());

        let result = session.controller.ask(&input.question).await;
        let container_id = session
            .controller
            .state()
            .containers()
            .first()
            .map(Container::id);

        if let (Some(path), Some(id)) = (input.html.as_ref(), container_id) {
            if let Some(page) = session.sink.page(id, &input.question) {
                tokio::fs::write(path, page).await?;
                info!("Wrote rendered answer to {}", path.display());
            }
        }

        let answer = result?;
        if !answer.is_empty() {
            println!("{answer}");
        }
        Ok(())
    }
}
