#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use cpstats::auth::{FileStore, SessionStore};
use cpstats::config::ClientConfig;
use cpstats::http::{ApiClient, MemoryNavigator, Route};
use serde_json::{json, Value};
use wiremock::MockServer;

/// Unsigned access token carrying `claims`.
pub fn token_with(claims: Value) -> String {
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("eyJhbGciOiJIUzI1NiJ9.{payload}.signature")
}

/// Access token for `username` with the given roles.
pub fn token_for(username: &str, roles: &[&str]) -> String {
    token_with(json!({ "sub": username, "roles": roles, "exp": 4_102_444_800_i64 }))
}

pub fn config(server: &MockServer) -> ClientConfig {
    ClientConfig::new()
        .with_base_url(server.uri())
        .with_timeout(Duration::from_secs(5))
        .with_report_poll_interval(Duration::from_millis(20))
}

pub fn client_with_store(
    config: ClientConfig,
    store: SessionStore,
) -> (ApiClient, Arc<MemoryNavigator>) {
    let navigator = Arc::new(MemoryNavigator::new(Route::Dashboard));
    let client = ApiClient::new(config, store, navigator.clone()).expect("build client");
    (client, navigator)
}

pub fn client(server: &MockServer) -> (ApiClient, Arc<MemoryNavigator>) {
    client_with_store(config(server), SessionStore::in_memory())
}

pub fn file_store(dir: &Path) -> SessionStore {
    SessionStore::new(Arc::new(FileStore::new(dir)))
}

/// Authorization header values of every request the server saw on `path`.
pub async fn bearers_for(server: &MockServer, path: &str) -> Vec<Option<String>> {
    server
        .received_requests()
        .await
        .expect("request recording enabled")
        .iter()
        .filter(|request| request.url.path() == path)
        .map(|request| {
            request
                .headers
                .get("authorization")
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        })
        .collect()
}
