//! Pure Firebase Identity Toolkit REST API client.
//!
//! A minimal client for Firebase phone authentication. Supports fetching
//! reCAPTCHA parameters, dispatching SMS verification codes, and exchanging
//! a received code for an identity token.
//!
//! # Example
//!
//! ```rust,ignore
//! use firebase::FirebaseAuthClient;
//!
//! let client = FirebaseAuthClient::new("your-api-key".into());
//!
//! let session_info = client
//!     .send_verification_code("+919876543210", &recaptcha_token)
//!     .await?;
//! let signin = client.sign_in_with_phone_number(&session_info, "123456").await?;
//! println!("{}", signin.id_token);
//! ```

pub mod error;
pub mod types;

pub use error::{FirebaseError, Result};
pub use types::{RecaptchaParamsResponse, SignInWithPhoneNumberResponse};

use serde::de::DeserializeOwned;
use types::{
    ErrorEnvelope, SendVerificationCodeRequest, SendVerificationCodeResponse,
    SignInWithPhoneNumberRequest,
};

const BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1";

pub struct FirebaseAuthClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl FirebaseAuthClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: BASE_URL.to_string(),
        }
    }

    /// Point the client at a different base URL (e.g. the Auth emulator).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Fetch the reCAPTCHA site key used to arm client-side bot checks.
    pub async fn fetch_recaptcha_params(&self) -> Result<RecaptchaParamsResponse> {
        let url = format!("{}/recaptchaParams?key={}", self.base_url, self.api_key);
        let resp = self.client.get(&url).send().await?;
        decode(resp).await
    }

    /// Dispatch an SMS verification code. Returns the opaque `sessionInfo`
    /// handle that binds the later code check to this specific send.
    pub async fn send_verification_code(
        &self,
        phone_number: &str,
        recaptcha_token: &str,
    ) -> Result<String> {
        tracing::debug!(phone_number, "Sending verification code");

        let url = format!(
            "{}/accounts:sendVerificationCode?key={}",
            self.base_url, self.api_key
        );
        let body = SendVerificationCodeRequest {
            phone_number: phone_number.to_string(),
            recaptcha_token: recaptcha_token.to_string(),
        };
        let resp = self.client.post(&url).json(&body).send().await?;

        let parsed: SendVerificationCodeResponse = decode(resp).await?;
        Ok(parsed.session_info)
    }

    /// Check a verification code against a previous send. Returns the
    /// signed-in user's tokens.
    pub async fn sign_in_with_phone_number(
        &self,
        session_info: &str,
        code: &str,
    ) -> Result<SignInWithPhoneNumberResponse> {
        let url = format!(
            "{}/accounts:signInWithPhoneNumber?key={}",
            self.base_url, self.api_key
        );
        let body = SignInWithPhoneNumberRequest {
            session_info: session_info.to_string(),
            code: code.to_string(),
        };
        let resp = self.client.post(&url).json(&body).send().await?;

        decode(resp).await
    }
}

/// Decode a response, mapping non-2xx bodies through the Google error envelope.
async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(parse_error_body(status.as_u16(), &body));
    }
    resp.json::<T>()
        .await
        .map_err(|e| FirebaseError::Parse(e.to_string()))
}

/// Parse a Google error envelope into an API error. The envelope `message`
/// carries the machine code, optionally followed by " : detail".
fn parse_error_body(status: u16, body: &str) -> FirebaseError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => {
            let code = envelope
                .error
                .message
                .split(':')
                .next()
                .unwrap_or("")
                .trim()
                .to_string();
            FirebaseError::Api {
                status,
                code,
                message: envelope.error.message,
            }
        }
        Err(_) => FirebaseError::Api {
            status,
            code: String::new(),
            message: body.to_string(),
        },
    }
}
