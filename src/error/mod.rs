//! Error types for cpstats.

pub mod unified;

pub use unified::{ErrorBody, ErrorCategory};

use std::sync::Arc;

use thiserror::Error;

/// Primary error type for all client operations.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("API error (status {status}): {message}")]
    Api {
        status: u16,
        message: String,
        body: Option<serde_json::Value>,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Invalid access token: {0}")]
    InvalidToken(String),

    #[error("Session refresh failed: {0}")]
    RefreshFailed(#[source] Arc<ClientError>),

    #[error("Session refresh was abandoned before it settled")]
    RefreshAbandoned,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout after {0}ms")]
    Timeout(u64),
}

impl ClientError {
    /// Create an API error from a status code and raw response body.
    ///
    /// The human-readable message is taken from the backend's `error` or
    /// `message` field when the body is JSON, otherwise the raw text.
    pub fn api(status: u16, body: &str) -> Self {
        let parsed = serde_json::from_str::<serde_json::Value>(body).ok();
        let message = parsed
            .as_ref()
            .and_then(|value| ErrorBody::from_value(value).message())
            .unwrap_or_else(|| {
                if body.trim().is_empty() {
                    format!("request failed with status {status}")
                } else {
                    body.to_string()
                }
            });
        Self::Api {
            status,
            message,
            body: parsed,
        }
    }

    /// HTTP status of the failed response, if the failure carried one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::RefreshFailed(cause) => cause.status(),
            _ => None,
        }
    }

    /// JSON body of the failed response, if any.
    pub fn body(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Api { body, .. } => body.as_ref(),
            _ => None,
        }
    }

    /// Whether the backend rejected the caller's credential.
    ///
    /// 401 and 403 are both treated as session expiry; the backend uses them
    /// interchangeably for expired and invalid credentials.
    pub fn is_session_expiry(&self) -> bool {
        matches!(self, Self::Api { status: 401 | 403, .. })
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Authentication(_) | Self::InvalidToken(_) => ErrorCategory::Authentication,
            Self::RefreshFailed(_) | Self::RefreshAbandoned => ErrorCategory::SessionExpired,
            Self::Network(_) => ErrorCategory::Network,
            Self::Timeout(_) => ErrorCategory::Timeout,
            Self::Configuration(_) => ErrorCategory::Configuration,
            Self::InvalidArgument(_) => ErrorCategory::Client,
            Self::Serialization(_) | Self::InvalidResponse(_) => ErrorCategory::Serialization,
            Self::Io(_) | Self::Storage(_) => ErrorCategory::Storage,
            Self::Api { status, .. } => match status {
                401 | 403 => ErrorCategory::SessionExpired,
                400..=499 => ErrorCategory::Client,
                500..=599 => ErrorCategory::Server,
                _ => ErrorCategory::Unknown,
            },
        }
    }

    /// Whether this error is potentially transient.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Network | ErrorCategory::Timeout | ErrorCategory::Server
        )
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ClientError>;
