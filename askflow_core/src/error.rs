//! Error taxonomy shared by every crate in the workspace.
//!
//! Service failures are classified into a fixed set of categories so the
//! session boundary can always show a categorized message instead of a raw
//! transport error.

use serde::Serialize;
use thiserror::Error;

/// Fixed failure categories surfaced to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Network,
    Auth,
    Permission,
    NotFound,
    RateLimit,
    Server,
    Unknown,
}

impl ErrorCategory {
    /// Classify an HTTP status code.
    #[must_use]
    pub const fn from_status(status: u16) -> Self {
        match status {
            401 => Self::Auth,
            403 => Self::Permission,
            404 => Self::NotFound,
            429 => Self::RateLimit,
            500..=599 => Self::Server,
            _ => Self::Unknown,
        }
    }

    /// The message shown in the tip area for this category.
    #[must_use]
    pub const fn user_message(self) -> &'static str {
        match self {
            Self::Network => "Network error: the service could not be reached. Check your connection and try again.",
            Self::Auth => "Authentication failed: check the API key in your configuration.",
            Self::Permission => "Permission denied: this key is not allowed to use the selected model or knowledge base.",
            Self::NotFound => "Not found: the configured endpoint, model or knowledge base does not exist.",
            Self::RateLimit => "Rate limited: too many requests, please wait a moment and try again.",
            Self::Server => "The service returned a server error. Please try again later.",
            Self::Unknown => "An unexpected error occurred while answering the question.",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Network => "network",
            Self::Auth => "auth",
            Self::Permission => "permission",
            Self::NotFound => "not_found",
            Self::RateLimit => "rate_limit",
            Self::Server => "server",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// A failed call to the retrieval or generation service.
#[derive(Debug, Clone, Error)]
#[error("{category} error: {message}")]
pub struct ServiceError {
    pub category: ErrorCategory,
    pub message: String,
}

impl ServiceError {
    #[must_use]
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
        }
    }

    /// Build an error from a non-success HTTP response.
    #[must_use]
    pub fn from_status(status: u16, body: &str) -> Self {
        Self::new(
            ErrorCategory::from_status(status),
            format!("HTTP {status}: {}", body.trim()),
        )
    }

    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Network, message)
    }
}

/// Ingestion-level failures. Malformed frames never surface here.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("stream transport error: {0}")]
    Transport(String),
}

impl StreamError {
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Transport(_) => ErrorCategory::Network,
        }
    }
}

/// Errors returned by one ask operation.
///
/// A user-initiated stop is not an error: the partial answer is returned
/// through the normal `Ok` path.
#[derive(Debug, Error)]
pub enum AskError {
    #[error("question is empty")]
    EmptyQuestion,

    #[error("retrieval failed: {0}")]
    Retrieval(#[source] ServiceError),

    #[error("generation failed: {0}")]
    Generation(#[source] ServiceError),

    #[error(transparent)]
    Transport(#[from] StreamError),
}

impl AskError {
    /// Category used for the user-facing message, if any.
    #[must_use]
    pub const fn category(&self) -> Option<ErrorCategory> {
        match self {
            Self::EmptyQuestion => None,
            Self::Retrieval(e) | Self::Generation(e) => Some(e.category),
            Self::Transport(e) => Some(e.category()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_status_codes() {
        assert_eq!(ErrorCategory::from_status(401), ErrorCategory::Auth);
        assert_eq!(ErrorCategory::from_status(403), ErrorCategory::Permission);
        assert_eq!(ErrorCategory::from_status(404), ErrorCategory::NotFound);
        assert_eq!(ErrorCategory::from_status(429), ErrorCategory::RateLimit);
        assert_eq!(ErrorCategory::from_status(502), ErrorCategory::Server);
        assert_eq!(ErrorCategory::from_status(418), ErrorCategory::Unknown);
    }

    #[test]
    fn ask_error_exposes_category() {
        let err = AskError::Generation(ServiceError::from_status(429, "slow down"));
        assert_eq!(err.category(), Some(ErrorCategory::RateLimit));

        let err = AskError::from(StreamError::Transport("reset".to_string()));
        assert_eq!(err.category(), Some(ErrorCategory::Network));

        assert_eq!(AskError::EmptyQuestion.category(), None);
    }

    #[test]
    fn service_error_message_includes_status() {
        let err = ServiceError::from_status(500, " boom \n");
        assert_eq!(err.message, "HTTP 500: boom");
        assert_eq!(err.to_string(), "server error: HTTP 500: boom");
    }
}
