//! Application backend client for the two sign-in endpoints.
//!
//! Both endpoints answer with the `{success, message, data}` envelope; the
//! body is read even on non-2xx statuses because rejections carry the
//! user-facing message in the envelope.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::types::{Profile, SessionGrant};

const CHECK_PHONE_PATH: &str = "/api/farmer/login/check-phone";
const VERIFY_OTP_PATH: &str = "/api/farmer/login/verify-otp";

/// Failure from the application backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend answered success=false; the message passes through to
    /// the user verbatim.
    #[error("{0}")]
    Rejected(String),

    /// Transport failure reaching the backend.
    #[error("Network error: {0}")]
    Network(String),

    /// The response body did not match the expected envelope.
    #[error("Unexpected response from server: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            BackendError::Malformed(err.to_string())
        } else {
            BackendError::Network(err.to_string())
        }
    }
}

/// Response envelope shared by all backend endpoints. Absent `message`
/// and `data` fields deserialize to `None`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: Option<String>,
    pub data: Option<T>,
}

#[derive(Debug, Serialize)]
struct CheckPhoneRequest<'a> {
    phone: &'a str,
}

#[derive(Debug, Serialize)]
struct VerifyOtpRequest<'a> {
    phone: &'a str,
    #[serde(rename = "idToken")]
    id_token: &'a str,
}

pub struct BackendClient {
    client: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Check that the phone belongs to a registered account. Returns the
    /// account profile on success.
    pub async fn check_phone(&self, phone: &str) -> Result<Profile, BackendError> {
        debug!(phone, "Checking phone with backend");

        let url = format!("{}{}", self.base_url, CHECK_PHONE_PATH);
        let resp = self
            .client
            .post(&url)
            .json(&CheckPhoneRequest { phone })
            .send()
            .await?;

        let envelope: ApiResponse<Profile> = resp
            .json()
            .await
            .map_err(|e| BackendError::Malformed(e.to_string()))?;
        unwrap_envelope(envelope)
    }

    /// Exchange a verified identity token for a session grant.
    pub async fn verify_otp(
        &self,
        phone: &str,
        id_token: &str,
    ) -> Result<SessionGrant, BackendError> {
        debug!(phone, "Verifying OTP with backend");

        let url = format!("{}{}", self.base_url, VERIFY_OTP_PATH);
        let resp = self
            .client
            .post(&url)
            .json(&VerifyOtpRequest { phone, id_token })
            .send()
            .await?;

        let envelope: ApiResponse<SessionGrant> = resp
            .json()
            .await
            .map_err(|e| BackendError::Malformed(e.to_string()))?;
        unwrap_envelope(envelope)
    }
}

/// Unpack the `{success, message, data}` envelope into a typed result.
fn unwrap_envelope<T>(envelope: ApiResponse<T>) -> Result<T, BackendError> {
    if !envelope.success {
        let message = envelope
            .message
            .unwrap_or_else(|| "Request failed. Please try again.".to_string());
        return Err(BackendError::Rejected(message));
    }
    envelope
        .data
        .ok_or_else(|| BackendError::Malformed("missing data field".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_success_yields_data() {
        let envelope: ApiResponse<Profile> =
            serde_json::from_str(r#"{"success":true,"message":"ok","data":{"name":"Asha"}}"#)
                .expect("envelope should parse");
        let profile = unwrap_envelope(envelope).expect("should unwrap");
        assert_eq!(profile.name.as_deref(), Some("Asha"));
    }

    #[test]
    fn test_envelope_rejection_passes_message_verbatim() {
        let envelope: ApiResponse<Profile> = serde_json::from_str(
            r#"{"success":false,"message":"Phone number not registered. Please contact sales."}"#,
        )
        .expect("envelope should parse");
        let err = unwrap_envelope(envelope).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Phone number not registered. Please contact sales."
        );
        assert!(matches!(err, BackendError::Rejected(_)));
    }

    #[test]
    fn test_envelope_rejection_without_message_gets_fallback() {
        let envelope: ApiResponse<Profile> =
            serde_json::from_str(r#"{"success":false}"#).expect("envelope should parse");
        let err = unwrap_envelope(envelope).unwrap_err();
        assert_eq!(err.to_string(), "Request failed. Please try again.");
    }

    #[test]
    fn test_envelope_parses_payloads_without_default_impls() {
        // SessionGrant has no Default; the envelope must not require one.
        let envelope: ApiResponse<SessionGrant> = serde_json::from_str(
            r#"{"success":true,"data":{"token":"T","farmer":{"name":"Asha"}}}"#,
        )
        .expect("envelope should parse");
        assert!(envelope.message.is_none());
        let grant = unwrap_envelope(envelope).expect("should unwrap");
        assert_eq!(grant.token, "T");

        let bare: ApiResponse<SessionGrant> =
            serde_json::from_str(r#"{"success":false}"#).expect("envelope should parse");
        assert!(bare.message.is_none());
        assert!(bare.data.is_none());
    }

    #[test]
    fn test_envelope_success_without_data_is_malformed() {
        let envelope: ApiResponse<SessionGrant> =
            serde_json::from_str(r#"{"success":true,"message":"ok"}"#)
                .expect("envelope should parse");
        let err = unwrap_envelope(envelope).unwrap_err();
        assert!(matches!(err, BackendError::Malformed(_)));
    }

    #[test]
    fn test_verify_request_uses_camel_case_token_field() {
        let body = serde_json::to_value(VerifyOtpRequest {
            phone: "9876543210",
            id_token: "tok",
        })
        .expect("request should serialize");
        assert_eq!(body.get("phone").and_then(|v| v.as_str()), Some("9876543210"));
        assert_eq!(body.get("idToken").and_then(|v| v.as_str()), Some("tok"));
        assert!(body.get("id_token").is_none());
    }
}
