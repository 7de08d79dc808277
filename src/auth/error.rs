use thiserror::Error;

use crate::error::ClientError;

/// Errors raised by session persistence and local token handling.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Malformed access token: {0}")]
    MalformedToken(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<std::io::Error> for AuthError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

impl From<toml::de::Error> for AuthError {
    fn from(error: toml::de::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

impl From<toml::ser::Error> for AuthError {
    fn from(error: toml::ser::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

impl From<AuthError> for ClientError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::MalformedToken(reason) => ClientError::InvalidToken(reason),
            other => ClientError::Storage(other.to_string()),
        }
    }
}
