//! Error classification and backend error payloads.

use serde::{Deserialize, Serialize};

/// Broad error category for routing recovery logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Authentication,
    SessionExpired,
    Network,
    Timeout,
    Server,
    Client,
    Configuration,
    Serialization,
    Storage,
    Unknown,
}

/// Error payload returned by the backend.
///
/// Different endpoints report the reason under `error` or `message`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    pub fn from_value(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(text) => Self {
                error: None,
                message: Some(text.clone()),
            },
            other => serde_json::from_value(other.clone()).unwrap_or_default(),
        }
    }

    /// Preferred human-readable reason, `error` first.
    pub fn message(&self) -> Option<String> {
        self.error
            .as_deref()
            .or(self.message.as_deref())
            .filter(|text| !text.trim().is_empty())
            .map(str::to_string)
    }
}
