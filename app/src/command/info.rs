use crate::store::JsonlTurnStore;
use askflow_config::{Config, masked_key};
use askflow_core::truncate_chars;

use super::history_path;

/// Strategy for displaying configuration information.
///
/// Keys are masked; the stored history is summarized by count.
#[derive(Debug, Clone, Copy)]
pub struct InfoStrategy;

impl super::CommandStrategy for InfoStrategy {
    type Input = ();

    async fn execute(&self, _input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load()?;

        println!("=== askflow Configuration ===\n");
        println!("File: {}\n", Config::config_path()?.display());

        println!("Generation:");
        let generation = &config.providers.generation;
        println!("  Base URL: {}", generation.base_url);
        println!("  API Key: {}", masked_key(&generation.api_key));
        println!();

        println!("Retrieval:");
        match &config.providers.retrieval {
            Some(retrieval) => {
                println!("  Base URL: {}", retrieval.base_url);
                println!("  API Key: {}", masked_key(&retrieval.api_key));
                println!("  Top K: {}", retrieval.top_k);
                println!("  Similarity Threshold: {}", retrieval.similarity_threshold);
            }
            None => println!("  (not configured)"),
        }
        println!(
            "  Knowledge Base: {}",
            config.knowledge_base.as_deref().unwrap_or("(none, direct answers)")
        );
        println!();

        let defaults = &config.agents.defaults;
        println!("Agent Defaults:");
        println!("  Model: {}", defaults.model);
        println!("  Max Tokens: {}", defaults.max_tokens);
        println!("  Temperature: {}", defaults.temperature);
        println!("  Stream: {}", defaults.stream);
        if let Some(prompt) = &defaults.system_prompt {
            println!("  System Prompt: {}", truncate_chars(prompt, 60));
        }
        println!();

        println!("Render:");
        println!("  Debounce: {} ms", config.render.debounce_ms);
        println!();

        let store = JsonlTurnStore::new(history_path()?);
        let turns = store.load().await?;
        println!("History:");
        println!("  File: {}", store.path().display());
        println!("  Stored Turns: {}", turns.len());
        if let Some(last) = turns.last() {
            println!("  Last Question: {}", truncate_chars(&last.question, 60));
            println!("  Last Asked: {}", last.timestamp.format("%Y-%m-%d %H:%M:%S UTC"));
        }

        Ok(())
    }
}
