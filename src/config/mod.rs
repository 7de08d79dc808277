//! Configuration system (layered: code > env > defaults).

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ClientError, Result};

/// Production API root.
pub const DEFAULT_BASE_URL: &str = "https://apis.byrohan.in/v1";

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_REPORT_POLL_SECS: u64 = 10;

/// Client configuration.
///
/// Resolution order:
/// 1. Values set in code through the `with_*` setters
/// 2. Environment variables (`CPSTATS_*`, `.env` honoured)
/// 3. Built-in defaults
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    base_url: String,
    store_dir: PathBuf,
    timeout: Duration,
    report_poll_interval: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientConfig {
    /// Defaults: production API, `~/.cpstats` store directory.
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            store_dir: default_store_dir(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            report_poll_interval: Duration::from_secs(DEFAULT_REPORT_POLL_SECS),
        }
    }

    /// Load from environment variables.
    ///
    /// Recognised: `CPSTATS_BASE_URL`, `CPSTATS_HOME`, `CPSTATS_TIMEOUT_SECS`,
    /// `CPSTATS_REPORT_POLL_SECS`.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::new();
        if let Some(url) = lookup("CPSTATS_BASE_URL") {
            config = config.with_base_url(url);
        }
        if let Some(dir) = lookup("CPSTATS_HOME") {
            config = config.with_store_dir(PathBuf::from(dir));
        }
        if let Some(raw) = lookup("CPSTATS_TIMEOUT_SECS") {
            config.timeout = Duration::from_secs(parse_secs("CPSTATS_TIMEOUT_SECS", &raw)?);
        }
        if let Some(raw) = lookup("CPSTATS_REPORT_POLL_SECS") {
            config.report_poll_interval =
                Duration::from_secs(parse_secs("CPSTATS_REPORT_POLL_SECS", &raw)?);
        }
        Ok(config)
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_store_dir(mut self, dir: PathBuf) -> Self {
        self.store_dir = dir;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_report_poll_interval(mut self, interval: Duration) -> Self {
        self.report_poll_interval = interval;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn store_dir(&self) -> &PathBuf {
        &self.store_dir
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn report_poll_interval(&self) -> Duration {
        self.report_poll_interval
    }

    /// Absolute URL for an API path such as `/auth/refresh`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

fn parse_secs(key: &str, raw: &str) -> Result<u64> {
    raw.trim().parse::<u64>().map_err(|_| {
        ClientError::Configuration(format!(
            "{key} must be a whole number of seconds, got '{raw}'"
        ))
    })
}

pub(crate) fn default_store_dir() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join(".cpstats"))
        .unwrap_or_else(|| PathBuf::from(".cpstats"))
}
