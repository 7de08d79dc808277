use std::sync::{PoisonError, RwLock};

use super::token::UserProfile;
use crate::api::{OtpOutcome, RegistrationDetails};
use crate::error::Result;
use crate::http::{ApiClient, Route};

/// Outcome of restoring a session at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Authenticated(UserProfile),
    Guest,
}

/// Session lifecycle on top of an [`ApiClient`].
///
/// Owns the decoded identity of the signed-in user. All I/O decisions
/// (printing, prompting) belong to the caller.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use cpstats::auth::{FileStore, SessionManager, SessionState, SessionStore};
/// use cpstats::config::ClientConfig;
/// use cpstats::http::{ApiClient, MemoryNavigator};
///
/// # async fn example() -> cpstats::error::Result<()> {
/// let config = ClientConfig::from_env()?;
/// let store = SessionStore::new(Arc::new(FileStore::new(config.store_dir().clone())));
/// let client = ApiClient::new(config, store, Arc::new(MemoryNavigator::default()))?;
/// let session = SessionManager::new(client);
/// if let SessionState::Authenticated(user) = session.bootstrap().await {
///     println!("signed in as {}", user.username);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct SessionManager {
    client: ApiClient,
    user: RwLock<Option<UserProfile>>,
}

impl SessionManager {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            user: RwLock::new(None),
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn current_user(&self) -> Option<UserProfile> {
        self.user
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_user(&self, user: Option<UserProfile>) {
        *self.user.write().unwrap_or_else(PoisonError::into_inner) = user;
    }

    /// Restore the session from the cached token, falling back to one silent refresh.
    ///
    /// A cached token that cannot be decoded is discarded before refreshing.
    pub async fn bootstrap(&self) -> SessionState {
        let cached = match self.client.store().access_token() {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read cached session");
                None
            }
        };

        if let Some(token) = cached {
            match UserProfile::from_access_token(&token) {
                Ok(profile) => {
                    if let Err(e) = self.client.install_token(&token) {
                        tracing::warn!(error = %e, "Failed to re-install cached token");
                    }
                    tracing::debug!(username = %profile.username, "Session restored from cache");
                    self.set_user(Some(profile.clone()));
                    return SessionState::Authenticated(profile);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Cached token is invalid; attempting silent refresh");
                    self.client.clear_token();
                }
            }
        }

        match self.client.refresh_session().await {
            Ok(token) => match self.login_success(&token) {
                Ok(profile) => SessionState::Authenticated(profile),
                Err(e) => {
                    tracing::warn!(error = %e, "Refreshed token could not be used");
                    self.client.clear_token();
                    SessionState::Guest
                }
            },
            Err(e) => {
                tracing::debug!(error = %e, "No session to restore");
                self.set_user(None);
                SessionState::Guest
            }
        }
    }

    /// Adopt a freshly issued access token.
    ///
    /// The token is decoded before anything is persisted, so a malformed
    /// token leaves the previous session untouched.
    pub fn login_success(&self, token: &str) -> Result<UserProfile> {
        let profile = UserProfile::from_access_token(token)?;
        self.client.install_token(token)?;
        self.set_user(Some(profile.clone()));
        self.client.navigator().navigate(Route::Dashboard);
        tracing::info!(username = %profile.username, admin = profile.is_admin(), "Logged in");
        Ok(profile)
    }

    /// Verify an OTP and log in, or move to registration for new accounts.
    pub async fn verify_otp(&self, username: &str, otp: &str) -> Result<OtpOutcome> {
        let outcome = self.client.verify_otp(username, otp).await?;
        match &outcome {
            OtpOutcome::Authenticated { access_token } => {
                self.login_success(access_token)?;
            }
            OtpOutcome::RegistrationRequired { email, .. } => {
                tracing::info!(email = %email, "New account detected; registration required");
                self.client.navigator().navigate(Route::CompleteRegistration);
            }
        }
        Ok(outcome)
    }

    /// Complete registration and log the new account in.
    pub async fn complete_registration(&self, details: RegistrationDetails) -> Result<UserProfile> {
        let token = self.client.complete_registration(details).await?;
        self.login_success(&token)
    }

    /// End the session. The server is told best-effort; local state is always cleared.
    pub async fn logout(&self) {
        if let Err(e) = self.client.logout_remote().await {
            tracing::debug!(error = %e, "Server-side logout failed; clearing local session anyway");
        }
        self.client.clear_token();
        self.set_user(None);
        self.client.navigator().redirect_to_login();
    }
}
