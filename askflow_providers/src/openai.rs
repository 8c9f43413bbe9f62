use crate::classify::{endpoint, request_error, status_error};
use askflow_core::{Generation, GenerationRequest, GenerationService, ServiceError};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde_json::json;
use tracing::{debug, info, warn};

/// Chat-completions client for any OpenAI-compatible endpoint.
pub struct OpenAiCompatProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAiCompatProvider {
    pub fn new(api_key: String) -> Self {
        info!("Creating OpenAiCompatProvider");
        Self {
            client: Client::new(),
            api_key,
            base_url: "https://api.openai.com/v1".to_string(),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    #[must_use]
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }
}

fn is_incremental(content_type: &str, requested: bool) -> bool {
    content_type.contains("event-stream")
        || content_type.contains("ndjson")
        || (requested && !content_type.contains("json"))
}

#[async_trait]
impl GenerationService for OpenAiCompatProvider {
    async fn generate(&self, request: &GenerationRequest) -> Result<Generation, ServiceError> {
        let body = json!({
            "model": request.model,
            "messages": request.messages,
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
            "stream": request.stream,
        });

        info!(
            "Sending request to generation API: model={}, stream={}",
            request.model, request.stream
        );

        let response = self
            .client
            .post(endpoint(&self.base_url, "chat/completions"))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| request_error(&e))?;

        if !response.status().is_success() {
            let err = status_error(response).await;
            warn!("Generation API rejected request: {err}");
            return Err(err);
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if is_incremental(&content_type, request.stream) {
            debug!("Generation API streaming ({content_type})");
            let chunks = response
                .bytes_stream()
                .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(anyhow::Error::from))
                .boxed();
            return Ok(Generation::Stream(chunks));
        }

        let value = response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| request_error(&e))?;
        info!("Received complete response from generation API");
        Ok(Generation::Complete(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_decides_the_mode() {
        assert!(is_incremental("text/event-stream; charset=utf-8", false));
        assert!(is_incremental("application/x-ndjson", false));
        assert!(is_incremental("", true));
        assert!(!is_incremental("application/json", true));
        assert!(!is_incremental("", false));
    }
}
