//! Client for the competitive-programming stats dashboard API.
//!
//! Provides an authenticated HTTP client that attaches the cached bearer
//! token to every request and recovers transparently from expired sessions:
//! concurrent failures share a single refresh call, and every caller is
//! retried once with the new token (or rejected together if the refresh
//! fails). Typed endpoints cover OTP login, registration, reports and the
//! admin panel.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use cpstats::prelude::*;
//!
//! # async fn example() -> cpstats::error::Result<()> {
//! let config = ClientConfig::from_env()?;
//! let store = SessionStore::new(Arc::new(FileStore::new(config.store_dir().clone())));
//! let client = ApiClient::new(config, store, Arc::new(MemoryNavigator::default()))?;
//! let session = SessionManager::new(client);
//!
//! if let SessionState::Authenticated(user) = session.bootstrap().await {
//!     let report = session.client().report(&user.username).await?;
//!     println!("{} problems solved", report.summary().total_solved);
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod prelude;

#[cfg(feature = "cli")]
pub mod cli;
