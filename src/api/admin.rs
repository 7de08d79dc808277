//! Admin panel endpoints. All of them require an admin session.

use serde::{Deserialize, Serialize};

use super::auth::require_non_empty;
use crate::error::Result;
use crate::http::{ApiClient, ApiRequest};

/// Backend health snapshot from `/admin/health`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub server: String,
    pub database: String,
    /// Bytes of heap in use on the server.
    pub used_memory: u64,
    pub available_processors: u32,
    pub version: String,
    pub timestamp: String,
    #[serde(default)]
    pub legal: Option<String>,
}

impl HealthReport {
    pub fn used_memory_mib(&self) -> f64 {
        self.used_memory as f64 / (1024.0 * 1024.0)
    }
}

impl ApiClient {
    pub async fn health(&self) -> Result<HealthReport> {
        self.execute(ApiRequest::get("/admin/health")).await?.json()
    }

    /// Permanently delete a user account.
    pub async fn delete_user(&self, username: &str) -> Result<()> {
        require_non_empty("username", username)?;
        self.execute(ApiRequest::delete("/auth/delete").query("username", username))
            .await?;
        tracing::info!(username, "User deleted");
        Ok(())
    }

    /// Revoke every session of a user.
    pub async fn revoke_sessions(&self, username: &str) -> Result<()> {
        require_non_empty("username", username)?;
        self.execute(ApiRequest::post("/auth/revoke").query("username", username))
            .await?;
        tracing::info!(username, "Sessions revoked");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn health_report_parses_backend_payload() {
        let report: HealthReport = serde_json::from_value(json!({
            "server": "UP",
            "database": "UP",
            "usedMemory": 104857600,
            "availableProcessors": 4,
            "version": "1.2.0",
            "timestamp": "2026-01-01T00:00:00Z",
            "legal": "(c) stats"
        }))
        .unwrap();
        assert_eq!(report.available_processors, 4);
        assert!((report.used_memory_mib() - 100.0).abs() < f64::EPSILON);
    }
}
