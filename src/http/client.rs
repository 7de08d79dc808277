//! Authenticated API client.
//!
//! Every request runs through the same ordered stages:
//!
//! 1. **attach**: resolve the bearer credential (cached token, explicit
//!    override on retry, or none for suppressed requests)
//! 2. **dispatch**: hand the request to the [`Transport`]
//! 3. **classify**: decide what a failure means for the session
//! 4. **recover**: for expired sessions, refresh once (single-flight) and
//!    retry the original request a single time

use std::sync::{Arc, PoisonError, RwLock};

use serde::Deserialize;

use super::navigator::Navigator;
use super::refresh::{RefreshCoordinator, RefreshTicket};
use super::request::{ApiRequest, ApiResponse, AuthMode, RequestKind, REFRESH_PATH};
use super::transport::{ReqwestTransport, Transport};
use crate::auth::store::SessionStore;
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};

/// What a failed dispatch means for the caller and the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Hand the error to the caller unchanged.
    Propagate,
    /// The refresh call was rejected: discard the session, then propagate.
    EndSession,
    /// Expired credential on an ordinary request: refresh and retry.
    Recover,
}

/// Classification stage.
pub fn classify(request: &ApiRequest, error: &ClientError) -> Disposition {
    if !error.is_session_expiry() {
        return Disposition::Propagate;
    }
    match request.kind() {
        RequestKind::Refresh => Disposition::EndSession,
        RequestKind::VerifyOtp => Disposition::Propagate,
        RequestKind::Standard if request.auth_mode() == AuthMode::Suppressed => {
            Disposition::Propagate
        }
        RequestKind::Standard if request.is_retried() => Disposition::Propagate,
        RequestKind::Standard => Disposition::Recover,
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshResponse {
    access_token: Option<String>,
}

/// HTTP client with bearer attachment and transparent session recovery.
///
/// Cloning is cheap; clones share the credential, the store and the refresh gate.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use cpstats::auth::SessionStore;
/// use cpstats::config::ClientConfig;
/// use cpstats::http::{ApiClient, ApiRequest, MemoryNavigator};
///
/// # async fn example() -> cpstats::error::Result<()> {
/// let client = ApiClient::new(
///     ClientConfig::from_env()?,
///     SessionStore::in_memory(),
///     Arc::new(MemoryNavigator::default()),
/// )?;
/// let health = client.execute(ApiRequest::get("/admin/health")).await?;
/// println!("{}", health.text());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<Inner>,
}

struct Inner {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    store: SessionStore,
    navigator: Arc<dyn Navigator>,
    refresh: RefreshCoordinator,
    credential: RwLock<Credential>,
}

/// In-memory credential used by the attachment stage. The store is only
/// consulted while this is `Unloaded`.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Credential {
    Unloaded,
    Absent,
    Bearer(String),
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("config", &self.inner.config)
            .field("refreshing", &self.inner.refresh.is_refreshing())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(
        config: ClientConfig,
        store: SessionStore,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self> {
        let transport = Arc::new(ReqwestTransport::new(config.clone())?);
        Ok(Self::with_transport(config, transport, store, navigator))
    }

    pub fn with_transport(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        store: SessionStore,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                transport,
                store,
                navigator,
                refresh: RefreshCoordinator::new(),
                credential: RwLock::new(Credential::Unloaded),
            }),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &SessionStore {
        &self.inner.store
    }

    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.inner.navigator
    }

    pub fn refresh_gate(&self) -> &RefreshCoordinator {
        &self.inner.refresh
    }

    /// Credential the attachment stage would use right now.
    ///
    /// The persisted token is read once, on first use; later installs and
    /// clears are authoritative even when persisting them fails.
    pub fn current_token(&self) -> Option<String> {
        let loaded = self
            .inner
            .credential
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match loaded {
            Credential::Bearer(token) => Some(token),
            Credential::Absent => None,
            Credential::Unloaded => self.load_credential(),
        }
    }

    fn load_credential(&self) -> Option<String> {
        let persisted = match self.inner.store.access_token() {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read cached access token");
                None
            }
        };
        let mut credential = self
            .inner
            .credential
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        // An install or clear that raced the read wins.
        if *credential == Credential::Unloaded {
            *credential = match &persisted {
                Some(token) => Credential::Bearer(token.clone()),
                None => Credential::Absent,
            };
        }
        match &*credential {
            Credential::Bearer(token) => Some(token.clone()),
            _ => None,
        }
    }

    fn set_credential(&self, credential: Credential) {
        *self
            .inner
            .credential
            .write()
            .unwrap_or_else(PoisonError::into_inner) = credential;
    }

    /// Use a new access token for every later request and persist it.
    ///
    /// The token is in effect even when the save fails; in that case the
    /// stale persisted token is removed so a restart does not pick it up.
    pub fn install_token(&self, token: &str) -> Result<()> {
        self.set_credential(Credential::Bearer(token.to_string()));
        if let Err(e) = self.inner.store.set_access_token(token) {
            if let Err(clear) = self.inner.store.clear_access_token() {
                tracing::warn!(error = %clear, "Failed to remove stale cached access token");
            }
            return Err(e.into());
        }
        Ok(())
    }

    /// Forget the access token locally (store and in-memory credential).
    pub fn clear_token(&self) {
        self.set_credential(Credential::Absent);
        if let Err(e) = self.inner.store.clear_access_token() {
            tracing::warn!(error = %e, "Failed to remove cached access token");
        }
    }

    /// Run a request through the full pipeline.
    pub async fn execute(&self, request: ApiRequest) -> Result<ApiResponse> {
        let request = self.attach(request);
        let error = match self.dispatch(&request).await {
            Ok(response) => return Ok(response),
            Err(error) => error,
        };
        match classify(&request, &error) {
            Disposition::Propagate => Err(error),
            Disposition::EndSession => {
                self.end_session();
                Err(error)
            }
            Disposition::Recover => self.recover(request, error).await,
        }
    }

    /// Exchange the session cookie for a new access token and install it.
    ///
    /// Not gated: callers that need single-flight semantics go through
    /// [`ApiClient::execute`]. Used for silent refresh at startup.
    pub async fn refresh_session(&self) -> Result<String> {
        let token = match self.request_new_token().await {
            Ok(token) => token,
            Err(error) => {
                if error.is_session_expiry() {
                    self.end_session();
                }
                return Err(error);
            }
        };
        self.install_token(&token)?;
        Ok(token)
    }

    fn attach(&self, mut request: ApiRequest) -> ApiRequest {
        if request.bearer().is_none() {
            request.set_bearer(self.current_token());
        }
        request
    }

    async fn dispatch(&self, request: &ApiRequest) -> Result<ApiResponse> {
        tracing::debug!(
            method = %request.method(),
            path = request.path(),
            authenticated = request.bearer().is_some(),
            retried = request.is_retried(),
            "Dispatching request"
        );
        let response = self.inner.transport.send(request).await?;
        tracing::debug!(path = request.path(), status = response.status(), "Response received");
        response.error_for_status()
    }

    async fn recover(&self, mut request: ApiRequest, error: ClientError) -> Result<ApiResponse> {
        request.mark_retried();

        // A refresh or login finished after this request left: reuse its token.
        if let Some(current) = self.current_token() {
            if request.bearer() != Some(current.as_str()) && !self.inner.refresh.is_refreshing() {
                tracing::debug!(path = request.path(), "Retrying with newer credential");
                request.set_bearer(Some(current));
                return self.dispatch(&request).await;
            }
        }

        match self.inner.refresh.enter() {
            RefreshTicket::Waiter(waiter) => {
                let token = waiter.wait().await.map_err(ClientError::RefreshFailed)?;
                request.set_bearer(Some(token));
                self.dispatch(&request).await
            }
            RefreshTicket::Leader(lease) => {
                tracing::debug!(path = request.path(), error = %error, "Session expired; refreshing");
                match self.request_new_token().await {
                    Ok(token) => {
                        if let Err(e) = self.install_token(&token) {
                            tracing::warn!(error = %e, "Failed to persist refreshed access token");
                        }
                        let released = lease.settle(Ok(token.clone()));
                        tracing::info!(released, "Session refreshed");
                        request.set_bearer(Some(token));
                        self.dispatch(&request).await
                    }
                    Err(cause) => {
                        let cause = Arc::new(cause);
                        let released = lease.settle(Err(Arc::clone(&cause)));
                        tracing::warn!(released, error = %cause, "Session refresh failed");
                        self.end_session();
                        Err(ClientError::RefreshFailed(cause))
                    }
                }
            }
        }
    }

    /// Call the refresh endpoint. Session cleanup is left to the caller so
    /// queued callers can be released first.
    async fn request_new_token(&self) -> Result<String> {
        let request = self.attach(ApiRequest::post(REFRESH_PATH));
        self.dispatch(&request)
            .await?
            .json::<RefreshResponse>()?
            .access_token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                ClientError::InvalidResponse("refresh response has no accessToken".to_string())
            })
    }

    /// Discard the local session and send the front-end to login.
    pub(crate) fn end_session(&self) {
        self.clear_token();
        if self.inner.navigator.redirect_to_login() {
            tracing::warn!("Session ended; redirected to login");
        }
    }
}
