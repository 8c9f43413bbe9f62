use askflow_core::{ErrorCategory, ServiceError};
use reqwest::Response;

/// Map a failed send or body read onto the error taxonomy.
pub fn request_error(e: &reqwest::Error) -> ServiceError {
    if let Some(status) = e.status() {
        return ServiceError::from_status(status.as_u16(), &e.to_string());
    }
    if e.is_decode() {
        return ServiceError::new(ErrorCategory::Unknown, format!("invalid response body: {e}"));
    }
    ServiceError::network(e.to_string())
}

/// Turn a non-success response into a categorized error, keeping the body
/// for the log.
pub async fn status_error(response: Response) -> ServiceError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    ServiceError::from_status(status, &body)
}

pub fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{path}", base_url.trim_end_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_without_double_slash() {
        assert_eq!(endpoint("http://h/v1/", "chat/completions"), "http://h/v1/chat/completions");
        assert_eq!(endpoint("http://h/api", "retrieval"), "http://h/api/retrieval");
    }
}
