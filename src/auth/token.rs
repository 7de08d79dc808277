use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::AuthError;

const ADMIN_ROLE: &str = "ROLE_ADMIN";

/// Identity decoded from an access token's claims.
///
/// The signature is not verified: the backend does that on every request.
/// Decoding only tells the client who it believes it is and when the token
/// will stop being accepted.
///
/// # Example
/// ```
/// use cpstats::auth::UserProfile;
///
/// // header.payload.signature, payload = {"sub":"alice","roles":["ROLE_USER"]}
/// let token = "e30.eyJzdWIiOiJhbGljZSIsInJvbGVzIjpbIlJPTEVfVVNFUiJdfQ.sig";
/// let profile = UserProfile::from_access_token(token)?;
/// assert_eq!(profile.username, "alice");
/// assert!(!profile.is_admin());
/// # Ok::<(), cpstats::auth::AuthError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    pub roles: Vec<String>,
    pub exp: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct Claims {
    sub: Option<String>,
    roles: Option<Vec<String>>,
    authorities: Option<Vec<String>>,
    exp: Option<i64>,
}

impl UserProfile {
    pub fn from_access_token(token: &str) -> Result<Self, AuthError> {
        let mut parts = token.split('.');
        let _header = parts
            .next()
            .filter(|part| !part.is_empty())
            .ok_or_else(|| AuthError::MalformedToken("missing header".into()))?;
        let payload = parts
            .next()
            .ok_or_else(|| AuthError::MalformedToken("missing payload".into()))?;
        let decoded = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|_| AuthError::MalformedToken("payload is not base64url".into()))?;
        let claims: Claims = serde_json::from_slice(&decoded)
            .map_err(|_| AuthError::MalformedToken("payload is not a JSON claims object".into()))?;

        Ok(Self {
            username: claims
                .sub
                .filter(|sub| !sub.is_empty())
                .unwrap_or_else(|| "User".to_string()),
            roles: claims.roles.or(claims.authorities).unwrap_or_default(),
            exp: claims.exp,
        })
    }

    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(|role| role == ADMIN_ROLE)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
    }

    /// Whether the embedded expiry is in the past. Tokens without one never expire.
    pub fn is_expired(&self) -> bool {
        self.expires_at().is_some_and(|at| at <= Utc::now())
    }
}

#[cfg(test)]
pub(crate) fn encode_test_token(claims: &serde_json::Value) -> String {
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("eyJhbGciOiJIUzI1NiJ9.{payload}.signature")
}
