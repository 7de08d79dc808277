//! Outbound request and response values flowing through the client pipeline.

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{ClientError, Result};

/// Path of the token refresh endpoint.
pub const REFRESH_PATH: &str = "/auth/refresh";
/// Path of the OTP verification endpoint.
pub const VERIFY_OTP_PATH: &str = "/auth/verify-otp";

/// How the credential-attachment stage treats a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    /// Attach the cached access token when one exists.
    #[default]
    Default,
    /// Never attach a credential, even when one is cached.
    Suppressed,
}

/// Role a request plays in session recovery, derived from its path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// The refresh call itself. Failure ends the session.
    Refresh,
    /// OTP verification. Failure is an ordinary application error.
    VerifyOtp,
    Standard,
}

impl RequestKind {
    pub fn classify(path: &str) -> Self {
        if path.contains(REFRESH_PATH) {
            Self::Refresh
        } else if path.contains(VERIFY_OTP_PATH) {
            Self::VerifyOtp
        } else {
            Self::Standard
        }
    }
}

/// A request to the backend, relative to the configured base URL.
///
/// # Example
/// ```
/// use cpstats::http::{ApiRequest, AuthMode};
///
/// let request = ApiRequest::post("/auth/revoke").query("username", "alice");
/// assert_eq!(request.auth_mode(), AuthMode::Default);
/// ```
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<serde_json::Value>,
    auth: AuthMode,
    bearer: Option<String>,
    retried: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            auth: AuthMode::Default,
            bearer: None,
            retried: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Send without a bearer credential.
    pub fn without_auth(mut self) -> Self {
        self.auth = AuthMode::Suppressed;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn body(&self) -> Option<&serde_json::Value> {
        self.body.as_ref()
    }

    pub fn auth_mode(&self) -> AuthMode {
        self.auth
    }

    pub fn kind(&self) -> RequestKind {
        RequestKind::classify(&self.path)
    }

    /// Credential that will be sent, as resolved by the attachment stage.
    pub fn bearer(&self) -> Option<&str> {
        self.bearer.as_deref()
    }

    pub fn is_retried(&self) -> bool {
        self.retried
    }

    pub(crate) fn set_bearer(&mut self, token: Option<String>) {
        self.bearer = match self.auth {
            AuthMode::Suppressed => None,
            AuthMode::Default => token,
        };
    }

    pub(crate) fn mark_retried(&mut self) {
        self.retried = true;
    }
}

/// A response with a 2xx status.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: u16,
    body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn text(&self) -> &str {
        &self.body
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.body)?)
    }

    /// Convert a non-2xx response into an API error.
    pub(crate) fn error_for_status(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ClientError::api(self.status, &self.body))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_recovery_roles_by_path() {
        assert_eq!(RequestKind::classify("/auth/refresh"), RequestKind::Refresh);
        assert_eq!(RequestKind::classify("/v1/auth/refresh"), RequestKind::Refresh);
        assert_eq!(RequestKind::classify("/auth/verify-otp"), RequestKind::VerifyOtp);
        assert_eq!(RequestKind::classify("/auth/send-otp"), RequestKind::Standard);
        assert_eq!(RequestKind::classify("/admin/health"), RequestKind::Standard);
    }

    #[test]
    fn suppressed_request_ignores_bearer() {
        let mut request = ApiRequest::post("/auth/complete-registration").without_auth();
        request.set_bearer(Some("cached".into()));
        assert!(request.bearer().is_none());

        let mut request = ApiRequest::get("/admin/health");
        request.set_bearer(Some("cached".into()));
        assert_eq!(request.bearer(), Some("cached"));
    }

    #[test]
    fn non_success_response_becomes_api_error() {
        let err = ApiResponse::new(401, r#"{"error":"Token expired"}"#)
            .error_for_status()
            .unwrap_err();
        assert!(err.is_session_expiry());
        assert_eq!(err.to_string(), "API error (status 401): Token expired");
    }
}
