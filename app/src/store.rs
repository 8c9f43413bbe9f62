use askflow_core::{Turn, TurnStore};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Appends each finished turn as one JSON line.
pub struct JsonlTurnStore {
    path: PathBuf,
}

impl JsonlTurnStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every stored turn, skipping lines that no longer parse.
    pub async fn load(&self) -> anyhow::Result<Vec<Turn>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        Ok(content
            .lines()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect())
    }
}

#[async_trait]
impl TurnStore for JsonlTurnStore {
    async fn record(&self, turn: &Turn) -> anyhow::Result<()> {
        let mut line = serde_json::to_string(turn)?;
        line.push('\n');
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        debug!("Appended turn to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use askflow_core::KnowledgeMatch;

    #[tokio::test]
    async fn turns_round_trip_through_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonlTurnStore::new(dir.path().join("history.jsonl"));
        assert!(store.load().await.unwrap().is_empty());

        let grounded = Turn::new(
            "q1",
            "a1",
            Some(KnowledgeMatch {
                knowledge_base_id: "kb".to_string(),
                match_count: 3,
            }),
        );
        store.record(&grounded).await.unwrap();
        store.record(&Turn::new("q2", "a2", None)).await.unwrap();

        let turns = store.load().await.unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0], grounded);
        assert_eq!(turns[1].question, "q2");
        assert_eq!(turns[1].match_count(), None);
    }
}
