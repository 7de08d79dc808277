//! OTP login, registration and logout endpoints.

use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::auth::device::DeviceFingerprint;
use crate::error::{ClientError, Result};
use crate::http::request::VERIFY_OTP_PATH;
use crate::http::{ApiClient, ApiRequest};

/// Body returned by the OTP and registration endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: Option<String>,
    pub token_type: Option<String>,
    pub new_user: Option<bool>,
    pub is_new_user: Option<bool>,
    pub registration_token: Option<String>,
    pub email: Option<String>,
    pub message: Option<String>,
}

/// What a successful OTP verification leads to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OtpOutcome {
    /// Existing account: the access token to log in with.
    Authenticated { access_token: String },
    /// Unknown account: registration must be completed first.
    RegistrationRequired {
        email: String,
        registration_token: Option<String>,
    },
}

impl AuthResponse {
    fn requires_registration(&self) -> bool {
        self.new_user == Some(true)
            || self.is_new_user == Some(true)
            || self.registration_token.is_some()
    }

    /// Interpret the response for `username`. Registration markers win over a token.
    pub fn outcome(self, username: &str) -> Option<OtpOutcome> {
        if self.requires_registration() {
            return Some(OtpOutcome::RegistrationRequired {
                email: self.email.unwrap_or_else(|| username.to_string()),
                registration_token: self.registration_token,
            });
        }
        self.access_token
            .filter(|token| !token.is_empty())
            .map(|access_token| OtpOutcome::Authenticated { access_token })
    }
}

/// Profile fields collected when completing a new account.
///
/// # Example
/// ```
/// use cpstats::api::RegistrationDetails;
///
/// let details = RegistrationDetails::builder()
///     .registration_token("reg-123")
///     .username("alice")
///     .full_name("Alice Example")
///     .phone_number("5550100")
///     .date_of_birth("2000-01-01")
///     .country("India")
///     .state("Karnataka")
///     .city("Bengaluru")
///     .pin_code("560001")
///     .leetcode_handle("alice_lc".to_string())
///     .build();
/// assert!(details.codeforces_handle.is_none());
/// ```
#[derive(Debug, Clone, Builder, PartialEq, Eq, Serialize, Deserialize)]
#[builder(on(String, into))]
#[serde(rename_all = "camelCase")]
pub struct RegistrationDetails {
    pub registration_token: String,
    pub username: String,
    pub full_name: String,
    pub phone_number: String,
    pub gender: Option<String>,
    pub date_of_birth: String,
    pub country: String,
    pub state: String,
    pub city: String,
    pub pin_code: String,
    pub codechef_handle: Option<String>,
    pub codeforces_handle: Option<String>,
    pub gfg_handle: Option<String>,
    pub leetcode_handle: Option<String>,
}

/// Wire body of `/auth/complete-registration`.
#[derive(Debug, Clone, Serialize)]
pub struct RegistrationPayload {
    #[serde(flatten)]
    pub details: RegistrationDetails,
    #[serde(flatten)]
    pub device: DeviceFingerprint,
}

#[derive(Debug, Serialize)]
struct OtpRequest<'a> {
    username: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    otp: Option<&'a str>,
}

impl ApiClient {
    /// Start an OTP challenge for a username or email.
    pub async fn send_otp(&self, username: &str) -> Result<()> {
        require_non_empty("username", username)?;
        let request = ApiRequest::post("/auth/send-otp").json(&OtpRequest {
            username,
            otp: None,
        })?;
        self.execute(request).await?;
        tracing::debug!(username, "OTP sent");
        Ok(())
    }

    /// Exchange an OTP for a token or a registration continuation.
    ///
    /// Never triggers session recovery. A rejection whose body still carries
    /// registration markers is treated as a registration outcome.
    pub async fn verify_otp(&self, username: &str, otp: &str) -> Result<OtpOutcome> {
        require_non_empty("username", username)?;
        require_non_empty("otp", otp)?;
        let request = ApiRequest::post(VERIFY_OTP_PATH).json(&OtpRequest {
            username,
            otp: Some(otp),
        })?;
        match self.execute(request).await {
            Ok(response) => response.json::<AuthResponse>()?.outcome(username).ok_or_else(|| {
                ClientError::InvalidResponse(
                    "verify-otp returned neither a token nor a registration token".to_string(),
                )
            }),
            Err(error) => {
                let continuation = error
                    .body()
                    .and_then(|body| serde_json::from_value::<AuthResponse>(body.clone()).ok())
                    .filter(AuthResponse::requires_registration);
                match continuation {
                    Some(response) => response.outcome(username).ok_or(error),
                    None => Err(error),
                }
            }
        }
    }

    /// Finalise a new account. Sent without a bearer credential.
    pub async fn complete_registration(&self, details: RegistrationDetails) -> Result<String> {
        require_non_empty("registration token", &details.registration_token)?;
        let payload = RegistrationPayload {
            details,
            device: DeviceFingerprint::collect(self.store())?,
        };
        let request = ApiRequest::post("/auth/complete-registration")
            .json(&payload)?
            .without_auth();
        let response: AuthResponse = self.execute(request).await?.json()?;
        response
            .access_token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                ClientError::InvalidResponse("registration response has no accessToken".to_string())
            })
    }

    /// Invalidate the server-side session.
    pub async fn logout_remote(&self) -> Result<()> {
        self.execute(ApiRequest::post("/auth/logout")).await?;
        Ok(())
    }
}

pub(crate) fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ClientError::InvalidArgument(format!("{field} must not be empty")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn response(value: serde_json::Value) -> AuthResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn token_response_authenticates() {
        let outcome = response(json!({ "accessToken": "abc", "tokenType": "Bearer" }))
            .outcome("alice");
        assert_eq!(
            outcome,
            Some(OtpOutcome::Authenticated {
                access_token: "abc".into()
            })
        );
    }

    #[test]
    fn any_registration_marker_requires_registration() {
        for body in [
            json!({ "newUser": true }),
            json!({ "isNewUser": true, "email": "a@b.c" }),
            json!({ "registrationToken": "reg", "accessToken": "ignored" }),
        ] {
            assert!(matches!(
                response(body).outcome("alice"),
                Some(OtpOutcome::RegistrationRequired { .. })
            ));
        }
    }

    #[test]
    fn registration_email_defaults_to_username() {
        let outcome = response(json!({ "newUser": true, "registrationToken": "reg" }))
            .outcome("alice@example.com");
        assert_eq!(
            outcome,
            Some(OtpOutcome::RegistrationRequired {
                email: "alice@example.com".into(),
                registration_token: Some("reg".into()),
            })
        );
    }

    #[test]
    fn empty_response_has_no_outcome() {
        assert_eq!(response(json!({ "message": "ok" })).outcome("alice"), None);
        assert_eq!(response(json!({ "accessToken": "" })).outcome("alice"), None);
    }

    #[test]
    fn registration_payload_flattens_details_and_device() {
        let details = RegistrationDetails::builder()
            .registration_token("reg")
            .username("alice")
            .full_name("Alice")
            .phone_number("1")
            .date_of_birth("2000-01-01")
            .country("IN")
            .state("KA")
            .city("BLR")
            .pin_code("560001")
            .gfg_handle("alice_gfg".to_string())
            .build();
        let device = DeviceFingerprint::collect(&crate::auth::SessionStore::in_memory()).unwrap();
        let value = serde_json::to_value(RegistrationPayload { details, device }).unwrap();

        assert_eq!(value["registrationToken"], "reg");
        assert_eq!(value["gfgHandle"], "alice_gfg");
        assert!(value["deviceId"].is_string());
        assert!(value.get("details").is_none());
    }
}
