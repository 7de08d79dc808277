mod support;

use std::time::Duration;

use cpstats::error::ClientError;
use cpstats::http::{ApiRequest, Navigator, Route};
use futures::future::join_all;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use support::{bearers_for, client};

async fn mount_report(server: &MockServer, bearer: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path("/reports/alice"))
        .and(header("authorization", format!("Bearer {bearer}").as_str()))
        .respond_with(
            ResponseTemplate::new(status).set_body_json(json!({ "leetcode": { "rating": 1500 } })),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn concurrent_expiries_share_one_refresh() {
    let server = MockServer::start().await;
    mount_report(&server, "old", 401).await;
    mount_report(&server, "new", 200).await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "accessToken": "new" }))
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (client, navigator) = client(&server);
    client.install_token("old").unwrap();

    let results = join_all((0..3).map(|_| client.execute(ApiRequest::get("/reports/alice")))).await;

    for result in results {
        assert_eq!(result.expect("retried request succeeds").status(), 200);
    }
    let bearers = bearers_for(&server, "/reports/alice").await;
    assert_eq!(bearers.len(), 6);
    assert_eq!(
        bearers
            .iter()
            .filter(|b| b.as_deref() == Some("Bearer new"))
            .count(),
        3
    );
    assert_eq!(client.current_token().as_deref(), Some("new"));
    assert_eq!(client.refresh_gate().cycles(), 1);
    assert!(!client.refresh_gate().is_refreshing());
    assert!(navigator.history().is_empty());
}

#[tokio::test]
async fn failed_refresh_rejects_every_caller_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/reports/alice"))
        .respond_with(ResponseTemplate::new(401))
        .expect(3)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_json(json!({ "error": "boom" }))
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (client, navigator) = client(&server);
    client.install_token("old").unwrap();

    let results = join_all((0..3).map(|_| client.execute(ApiRequest::get("/reports/alice")))).await;

    for result in results {
        let err = result.expect_err("refresh failure is shared");
        assert!(matches!(err, ClientError::RefreshFailed(_)), "got {err:?}");
        assert_eq!(err.status(), Some(500));
    }
    assert!(client.current_token().is_none());
    assert_eq!(navigator.login_redirects(), 1);
    assert_eq!(navigator.current(), Route::Login);
    assert!(!client.refresh_gate().is_refreshing());
}

#[tokio::test]
async fn rejected_refresh_redirects_exactly_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/reports/alice"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "error": "no session" })))
        .expect(1)
        .mount(&server)
        .await;

    let (client, navigator) = client(&server);
    client.install_token("old").unwrap();

    let err = client
        .execute(ApiRequest::get("/reports/alice"))
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(401));
    assert_eq!(navigator.login_redirects(), 1);
    assert!(client.current_token().is_none());
}

#[tokio::test]
async fn concurrent_failures_on_rejected_refresh_redirect_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/reports/alice"))
        .respond_with(ResponseTemplate::new(401))
        .expect(3)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({ "error": "no session" }))
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (client, navigator) = client(&server);
    client.install_token("old").unwrap();

    let results = join_all((0..3).map(|_| client.execute(ApiRequest::get("/reports/alice")))).await;

    for result in results {
        let err = result.expect_err("rejected refresh is shared");
        assert!(matches!(err, ClientError::RefreshFailed(_)), "got {err:?}");
        assert_eq!(err.status(), Some(401));
    }
    assert_eq!(navigator.login_redirects(), 1);
    assert!(client.current_token().is_none());
    assert_eq!(client.refresh_gate().cycles(), 1);
}

#[tokio::test]
async fn refresh_endpoint_failure_is_not_recovered() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let (client, navigator) = client(&server);
    client.install_token("old").unwrap();

    let err = client
        .execute(ApiRequest::post("/auth/refresh"))
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(401));
    assert_eq!(client.refresh_gate().cycles(), 0);
    assert_eq!(navigator.login_redirects(), 1);
}

#[tokio::test]
async fn verify_otp_rejection_never_refreshes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/verify-otp"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "error": "Invalid OTP" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "accessToken": "x" })))
        .expect(0)
        .mount(&server)
        .await;

    let (client, navigator) = client(&server);

    let err = client.verify_otp("alice", "000000").await.unwrap_err();

    assert_eq!(err.to_string(), "API error (status 401): Invalid OTP");
    assert!(navigator.history().is_empty());
}

#[tokio::test]
async fn suppressed_request_carries_no_bearer_and_is_not_recovered() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/complete-registration"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "accessToken": "x" })))
        .expect(0)
        .mount(&server)
        .await;

    let (client, _) = client(&server);
    client.install_token("cached").unwrap();

    let request = ApiRequest::post("/auth/complete-registration")
        .json(&json!({ "registrationToken": "reg" }))
        .unwrap()
        .without_auth();
    let err = client.execute(request).await.unwrap_err();

    assert_eq!(err.status(), Some(401));
    assert_eq!(
        bearers_for(&server, "/auth/complete-registration").await,
        vec![None]
    );
    assert_eq!(client.current_token().as_deref(), Some("cached"));
}

#[tokio::test]
async fn unauthenticated_request_is_recovered_by_cookie_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/admin/health"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "server": "UP" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/admin/health"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "accessToken": "fresh" })))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client(&server);

    let response = client.execute(ApiRequest::get("/admin/health")).await.unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(
        bearers_for(&server, "/admin/health").await,
        vec![None, Some("Bearer fresh".to_string())]
    );
}

#[tokio::test]
async fn network_failure_is_propagated_unchanged() {
    let config = cpstats::config::ClientConfig::new()
        .with_base_url("http://127.0.0.1:1")
        .with_timeout(Duration::from_secs(2));
    let (client, navigator) =
        support::client_with_store(config, cpstats::auth::SessionStore::in_memory());
    client.install_token("tok").unwrap();

    let err = client
        .execute(ApiRequest::get("/admin/health"))
        .await
        .unwrap_err();

    assert!(
        matches!(err, ClientError::Network(_) | ClientError::Timeout(_)),
        "got {err:?}"
    );
    assert_eq!(err.status(), None);
    assert_eq!(client.refresh_gate().cycles(), 0);
    assert!(navigator.history().is_empty());
    assert_eq!(client.current_token().as_deref(), Some("tok"));
}
