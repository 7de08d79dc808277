//! Aggregated competitive-programming reports.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{AsRefStr, Display, EnumIter, IntoEnumIterator};

use super::auth::require_non_empty;
use crate::error::{ClientError, ErrorCategory, Result};
use crate::http::{ApiClient, ApiRequest};

/// Platforms a report aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumIter)]
pub enum Platform {
    #[strum(serialize = "leetcode")]
    LeetCode,
    #[strum(serialize = "geeksforgeeks")]
    GeeksForGeeks,
    #[strum(serialize = "codechef")]
    CodeChef,
    #[strum(serialize = "codeforces")]
    Codeforces,
}

impl Platform {
    /// Whether the platform publishes a contest rating.
    pub fn is_rated(self) -> bool {
        !matches!(self, Self::GeeksForGeeks)
    }
}

/// One platform's section of a report. Unknown fields are kept as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlatformStats {
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl PlatformStats {
    pub fn problems_solved_total(&self) -> u64 {
        self.fields
            .get("problems_solved_total")
            .and_then(as_number)
            .map(|n| n.max(0.0) as u64)
            .unwrap_or(0)
    }

    pub fn rating(&self) -> f64 {
        self.fields.get("rating").and_then(as_number).unwrap_or(0.0)
    }
}

// The scrapers behind the report emit numbers and numeric strings alike.
fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Report returned by `/reports/{username}`, keyed by platform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    #[serde(flatten)]
    pub sections: Map<String, Value>,
}

/// Headline numbers across all platforms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportSummary {
    pub total_solved: u64,
    pub max_rating: f64,
}

impl Report {
    pub fn platform(&self, platform: Platform) -> Option<PlatformStats> {
        self.sections
            .get(platform.as_ref())
            .and_then(|section| serde_json::from_value(section.clone()).ok())
    }

    pub fn summary(&self) -> ReportSummary {
        let mut summary = ReportSummary {
            total_solved: 0,
            max_rating: 0.0,
        };
        for platform in Platform::iter() {
            let Some(stats) = self.platform(platform) else {
                continue;
            };
            summary.total_solved += stats.problems_solved_total();
            if platform.is_rated() {
                summary.max_rating = summary.max_rating.max(stats.rating());
            }
        }
        summary
    }
}

// Characters that would move a username out of its path segment.
const RESERVED_IN_SEGMENT: &[char] = &['/', '?', '#'];

impl ApiClient {
    pub async fn report(&self, username: &str) -> Result<Report> {
        require_non_empty("username", username)?;
        if let Some(c) = username.chars().find(|c| RESERVED_IN_SEGMENT.contains(c)) {
            return Err(ClientError::InvalidArgument(format!(
                "username '{username}' must not contain '{c}'"
            )));
        }
        self.execute(ApiRequest::get(format!("/reports/{username}")))
            .await?
            .json()
    }

    /// Poll for a report that may not exist yet, as for a just-registered account.
    ///
    /// Retries every `report_poll_interval` until the report is found or
    /// `deadline` elapses. Session failures and bad input stop polling at once.
    pub async fn wait_for_report(&self, username: &str, deadline: Duration) -> Result<Report> {
        let started = tokio::time::Instant::now();
        let interval = self.config().report_poll_interval();
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.report(username).await {
                Ok(report) => return Ok(report),
                Err(e) if !keeps_polling(&e) => return Err(e),
                Err(e) => {
                    if started.elapsed() + interval > deadline {
                        return Err(e);
                    }
                    tracing::debug!(attempt, username, error = %e, "Report not ready; polling again");
                    tokio::time::sleep(interval).await;
                }
            }
        }
    }
}

fn keeps_polling(error: &ClientError) -> bool {
    !matches!(
        error.category(),
        ErrorCategory::SessionExpired | ErrorCategory::Configuration
    ) && !matches!(error, ClientError::InvalidArgument(_))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn report(value: Value) -> Report {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn summary_sums_solved_and_takes_max_rated() {
        let r = report(json!({
            "leetcode": { "problems_solved_total": 120, "rating": 1650.5 },
            "geeksforgeeks": { "problems_solved_total": 40, "rating": 9999 },
            "codechef": { "problems_solved_total": "15", "rating": "1720" },
            "codeforces": { "rating": 1400 }
        }));
        assert_eq!(
            r.summary(),
            ReportSummary {
                total_solved: 175,
                max_rating: 1720.0
            }
        );
    }

    #[test]
    fn missing_sections_count_as_zero() {
        let r = report(json!({ "default_user": "alice" }));
        assert_eq!(
            r.summary(),
            ReportSummary {
                total_solved: 0,
                max_rating: 0.0
            }
        );
        assert!(r.platform(Platform::LeetCode).is_none());
    }

    #[test]
    fn platform_keys_match_report_sections() {
        let keys: Vec<String> = Platform::iter().map(|p| p.to_string()).collect();
        assert_eq!(keys, vec!["leetcode", "geeksforgeeks", "codechef", "codeforces"]);
    }

    #[test]
    fn polling_stops_on_session_failures() {
        assert!(keeps_polling(&ClientError::api(404, "not yet")));
        assert!(keeps_polling(&ClientError::api(502, "")));
        assert!(!keeps_polling(&ClientError::RefreshAbandoned));
        assert!(!keeps_polling(&ClientError::InvalidArgument("x".into())));
    }
}
