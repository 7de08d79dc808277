//! Device fingerprint sent with account registration.

use serde::{Deserialize, Serialize};

use super::error::AuthError;
use super::store::SessionStore;

/// Facts about the installation the account is registered from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceFingerprint {
    pub device_id: String,
    pub platform: String,
    pub os_version: String,
    pub app_version: String,
    pub screen_resolution: String,
    pub language: String,
    pub referral_source: Option<String>,
}

impl DeviceFingerprint {
    /// Collect the fingerprint, generating and persisting a device id on first use.
    pub fn collect(store: &SessionStore) -> Result<Self, AuthError> {
        Ok(Self {
            device_id: store.device_id()?,
            platform: std::env::consts::OS.to_string(),
            os_version: format!("{} {}", std::env::consts::OS, std::env::consts::ARCH),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            screen_resolution: "unknown".to_string(),
            language: detect_language(|key| std::env::var(key).ok()),
            referral_source: Some("direct".to_string()),
        })
    }
}

/// `LANG=en_GB.UTF-8` becomes `en-GB`; defaults to `en-US`.
fn detect_language(lookup: impl Fn(&str) -> Option<String>) -> String {
    ["LC_ALL", "LANG"]
        .iter()
        .filter_map(|key| lookup(key))
        .map(|raw| raw.split('.').next().unwrap_or_default().replace('_', "-"))
        .find(|lang| !lang.is_empty() && lang != "C" && lang != "POSIX")
        .unwrap_or_else(|| "en-US".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_is_normalised_from_locale() {
        let lang = detect_language(|key| (key == "LANG").then(|| "en_GB.UTF-8".to_string()));
        assert_eq!(lang, "en-GB");
    }

    #[test]
    fn posix_locale_falls_back_to_default() {
        let lang = detect_language(|_| Some("C".to_string()));
        assert_eq!(lang, "en-US");
    }

    #[test]
    fn fingerprint_reuses_the_stored_device_id() {
        let store = SessionStore::in_memory();
        let first = DeviceFingerprint::collect(&store).unwrap();
        let second = DeviceFingerprint::collect(&store).unwrap();
        assert_eq!(first.device_id, second.device_id);
        assert_eq!(first.app_version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn serializes_with_backend_field_names() {
        let store = SessionStore::in_memory();
        let value = serde_json::to_value(DeviceFingerprint::collect(&store).unwrap()).unwrap();
        for field in ["deviceId", "platform", "osVersion", "appVersion", "screenResolution", "language"] {
            assert!(value.get(field).is_some(), "missing {field}");
        }
    }
}
