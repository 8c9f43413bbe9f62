use crate::classify::{endpoint, request_error, status_error};
use askflow_core::{ErrorCategory, KnowledgeItem, RetrievalOutcome, RetrievalService, ServiceError};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use tracing::{info, warn};

/// Knowledge-base search over HTTP (`POST {base}/retrieval`).
pub struct HttpRetrievalProvider {
    client: Client,
    api_key: String,
    base_url: String,
    top_k: usize,
    similarity_threshold: f64,
}

impl HttpRetrievalProvider {
    pub fn new(api_key: String, base_url: String) -> Self {
        info!("Creating HttpRetrievalProvider");
        Self {
            client: Client::new(),
            api_key,
            base_url,
            top_k: 8,
            similarity_threshold: 0.2,
        }
    }

    #[must_use]
    pub const fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    #[must_use]
    pub const fn with_similarity_threshold(mut self, threshold: f64) -> Self {
        self.similarity_threshold = threshold;
        self
    }
}

const ITEM_LISTS: [&str; 4] = ["/data/chunks", "/chunks", "/records", "/data"];
const TITLE_KEYS: [&str; 3] = ["document_keyword", "document_name", "title"];
const CONTENT_KEYS: [&str; 3] = ["content", "content_with_weight", "text"];
const SCORE_KEYS: [&str; 2] = ["similarity", "score"];

fn first_str<'a>(item: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .find_map(|key| item.get(*key).and_then(Value::as_str))
        .filter(|s| !s.trim().is_empty())
}

fn to_item(item: &Value) -> Option<KnowledgeItem> {
    let content = first_str(item, &CONTENT_KEYS)?;
    Some(KnowledgeItem {
        title: first_str(item, &TITLE_KEYS).unwrap_or("Untitled").to_string(),
        content: content.to_string(),
        score: SCORE_KEYS
            .iter()
            .find_map(|key| item.get(*key).and_then(Value::as_f64)),
    })
}

/// Pull snippets out of the known response shapes, in service order.
fn extract_items(body: &Value) -> Vec<KnowledgeItem> {
    ITEM_LISTS
        .iter()
        .find_map(|pointer| body.pointer(pointer).and_then(Value::as_array))
        .map(|items| items.iter().filter_map(to_item).collect())
        .unwrap_or_default()
}

/// Some services report failures in the body with HTTP 200.
fn body_error(body: &Value) -> Option<ServiceError> {
    let code = body.get("code").and_then(Value::as_i64)?;
    if code == 0 {
        return None;
    }
    let message = body
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("retrieval failed");
    let category = u16::try_from(code)
        .map_or(ErrorCategory::Unknown, ErrorCategory::from_status);
    Some(ServiceError::new(category, format!("code {code}: {message}")))
}

#[async_trait]
impl RetrievalService for HttpRetrievalProvider {
    async fn retrieve(
        &self,
        question: &str,
        dataset_id: Option<&str>,
    ) -> Result<RetrievalOutcome, ServiceError> {
        let body = json!({
            "question": question,
            "dataset_ids": dataset_id.into_iter().collect::<Vec<_>>(),
            "top_k": self.top_k,
            "similarity_threshold": self.similarity_threshold,
        });

        info!("Sending retrieval request: dataset={dataset_id:?}");

        let response = self
            .client
            .post(endpoint(&self.base_url, "retrieval"))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| request_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let err = status_error(response).await;
            warn!("Retrieval API rejected request: {err}");
            return Err(err);
        }

        let value = response
            .json::<Value>()
            .await
            .map_err(|e| request_error(&e))?;
        if let Some(err) = body_error(&value) {
            warn!("Retrieval API reported failure: {err}");
            return Err(err);
        }

        let items = extract_items(&value);
        info!("Retrieval returned {} matches", items.len());
        Ok(RetrievalOutcome {
            status: status.as_u16(),
            items,
        })
    }
}
