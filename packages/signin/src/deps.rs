//! Sign-in dependencies (using traits for testability)
//!
//! This module provides the central dependency container used by the
//! sign-in controller. All external services use trait abstractions to
//! enable testing.

use std::sync::Arc;

use async_trait::async_trait;
use firebase::FirebaseAuthClient;
use tracing::debug;
use uuid::Uuid;

use crate::backend::{BackendClient, BackendError};
use crate::challenge::Challenge;
use crate::error::{ProviderError, ProviderErrorCode};
use crate::traits::{
    BaseBackendService, BaseChallengeWidget, BasePhoneAuthService, BaseSessionStore,
};
use crate::types::{Credential, PendingConfirmation, Profile, SessionGrant};

// =============================================================================
// FirebaseAuthClient Adapter (implements BasePhoneAuthService trait)
// =============================================================================

/// Maps a Firebase Identity Toolkit error to the provider code taxonomy.
fn map_firebase_error(err: firebase::FirebaseError) -> ProviderError {
    let code = match &err {
        firebase::FirebaseError::Api { code, .. } => match code.as_str() {
            "INVALID_PHONE_NUMBER" => ProviderErrorCode::InvalidPhoneNumber,
            "TOO_MANY_ATTEMPTS_TRY_LATER" => ProviderErrorCode::TooManyRequests,
            "QUOTA_EXCEEDED" => ProviderErrorCode::QuotaExceeded,
            "CAPTCHA_CHECK_FAILED" => ProviderErrorCode::CaptchaCheckFailed,
            "OPERATION_NOT_ALLOWED" => ProviderErrorCode::OperationNotAllowed,
            "INVALID_CODE" | "MISSING_CODE" => ProviderErrorCode::InvalidVerificationCode,
            "SESSION_EXPIRED" => ProviderErrorCode::CodeExpired,
            "PHONE_NUMBER_EXISTS" => ProviderErrorCode::CredentialAlreadyInUse,
            "INTERNAL_ERROR" => ProviderErrorCode::InternalError,
            _ => ProviderErrorCode::Unknown,
        },
        firebase::FirebaseError::Network(_) => ProviderErrorCode::NetworkRequestFailed,
        firebase::FirebaseError::Parse(_) => ProviderErrorCode::InternalError,
    };
    ProviderError::new(code, err.to_string())
}

/// Wrapper around FirebaseAuthClient that implements BasePhoneAuthService.
///
/// The bot-check widget is embedder-supplied: Firebase only validates the
/// tokens it produces, so the adapter pairs the REST client with whatever
/// widget the host application renders.
pub struct FirebaseAdapter {
    client: Arc<FirebaseAuthClient>,
    widget: Arc<dyn BaseChallengeWidget>,
}

impl FirebaseAdapter {
    pub fn new(client: Arc<FirebaseAuthClient>, widget: Arc<dyn BaseChallengeWidget>) -> Self {
        Self { client, widget }
    }
}

#[async_trait]
impl BasePhoneAuthService for FirebaseAdapter {
    async fn create_challenge(&self, container_id: &str) -> Result<Challenge, ProviderError> {
        let params = self
            .client
            .fetch_recaptcha_params()
            .await
            .map_err(map_firebase_error)?;
        let widget_id = self.widget.render(container_id).await.map_err(|e| {
            ProviderError::new(ProviderErrorCode::InternalError, e.to_string())
        })?;
        Ok(Challenge {
            id: Uuid::new_v4(),
            container_id: container_id.to_string(),
            site_key: params.recaptcha_site_key,
            widget_id,
        })
    }

    async fn destroy_challenge(&self, challenge: &Challenge) -> Result<(), ProviderError> {
        debug!(challenge_id = %challenge.id, "Clearing challenge widget");
        self.widget.clear().await.map_err(|e| {
            ProviderError::new(ProviderErrorCode::InternalError, e.to_string())
        })
    }

    async fn send_otp(
        &self,
        international_phone: &str,
        challenge: &Challenge,
    ) -> Result<PendingConfirmation, ProviderError> {
        debug!(challenge_id = %challenge.id, "Executing challenge for OTP send");
        let token = self.widget.execute().await.map_err(|e| {
            ProviderError::new(ProviderErrorCode::CaptchaCheckFailed, e.to_string())
        })?;
        let session_info = self
            .client
            .send_verification_code(international_phone, &token)
            .await
            .map_err(map_firebase_error)?;
        Ok(PendingConfirmation { session_info })
    }

    async fn confirm_otp(
        &self,
        confirmation: &PendingConfirmation,
        code: &str,
    ) -> Result<Credential, ProviderError> {
        let resp = self
            .client
            .sign_in_with_phone_number(&confirmation.session_info, code)
            .await
            .map_err(map_firebase_error)?;
        Ok(Credential {
            uid: resp.local_id,
            id_token: resp.id_token,
        })
    }

    async fn fetch_id_token(&self, credential: &Credential) -> Result<String, ProviderError> {
        // The sign-in response already carries a fresh token, no refresh
        // round-trip is needed within a single sign-in attempt.
        Ok(credential.id_token.clone())
    }
}

// =============================================================================
// BackendClient (implements BaseBackendService trait)
// =============================================================================

#[async_trait]
impl BaseBackendService for BackendClient {
    async fn check_phone(&self, phone: &str) -> Result<Profile, BackendError> {
        BackendClient::check_phone(self, phone).await
    }

    async fn verify_otp(
        &self,
        phone: &str,
        id_token: &str,
    ) -> Result<SessionGrant, BackendError> {
        BackendClient::verify_otp(self, phone, id_token).await
    }
}

// =============================================================================
// SignInDeps
// =============================================================================

/// Sign-in dependencies accessible to the controller (using traits for
/// testability)
#[derive(Clone)]
pub struct SignInDeps {
    pub phone_auth: Arc<dyn BasePhoneAuthService>,
    pub backend: Arc<dyn BaseBackendService>,
    pub session_store: Arc<dyn BaseSessionStore>,
}

impl SignInDeps {
    /// Create new SignInDeps with the given dependencies
    pub fn new(
        phone_auth: Arc<dyn BasePhoneAuthService>,
        backend: Arc<dyn BaseBackendService>,
        session_store: Arc<dyn BaseSessionStore>,
    ) -> Self {
        Self {
            phone_auth,
            backend,
            session_store,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    fn api_err(code: &str) -> firebase::FirebaseError {
        firebase::FirebaseError::Api {
            status: 400,
            code: code.to_string(),
            message: code.to_string(),
        }
    }

    #[test]
    fn test_map_firebase_api_codes() {
        let cases = [
            ("INVALID_PHONE_NUMBER", ProviderErrorCode::InvalidPhoneNumber),
            ("TOO_MANY_ATTEMPTS_TRY_LATER", ProviderErrorCode::TooManyRequests),
            ("QUOTA_EXCEEDED", ProviderErrorCode::QuotaExceeded),
            ("CAPTCHA_CHECK_FAILED", ProviderErrorCode::CaptchaCheckFailed),
            ("OPERATION_NOT_ALLOWED", ProviderErrorCode::OperationNotAllowed),
            ("INVALID_CODE", ProviderErrorCode::InvalidVerificationCode),
            ("MISSING_CODE", ProviderErrorCode::InvalidVerificationCode),
            ("SESSION_EXPIRED", ProviderErrorCode::CodeExpired),
            ("PHONE_NUMBER_EXISTS", ProviderErrorCode::CredentialAlreadyInUse),
            ("INTERNAL_ERROR", ProviderErrorCode::InternalError),
            ("SOMETHING_ELSE", ProviderErrorCode::Unknown),
        ];
        for (raw, expected) in cases {
            assert_eq!(map_firebase_error(api_err(raw)).code, expected, "{raw}");
        }
    }

    #[test]
    fn test_map_firebase_transport_errors() {
        let err = map_firebase_error(firebase::FirebaseError::Network("timed out".into()));
        assert_eq!(err.code, ProviderErrorCode::NetworkRequestFailed);

        let err = map_firebase_error(firebase::FirebaseError::Parse("bad json".into()));
        assert_eq!(err.code, ProviderErrorCode::InternalError);
    }

    struct FailingWidget;

    #[async_trait]
    impl BaseChallengeWidget for FailingWidget {
        async fn render(&self, _container_id: &str) -> anyhow::Result<String> {
            Ok("widget-1".to_string())
        }

        async fn execute(&self) -> anyhow::Result<String> {
            Err(anyhow!("widget crashed"))
        }

        async fn clear(&self) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_widget_execute_failure_maps_to_captcha_check_failed() {
        // Point the client at an unroutable address so a token leak past the
        // widget failure would surface as a network error instead.
        let client = Arc::new(
            FirebaseAuthClient::new("test-key".to_string())
                .with_base_url("http://127.0.0.1:9"),
        );
        let adapter = FirebaseAdapter::new(client, Arc::new(FailingWidget));
        let challenge = Challenge {
            id: Uuid::new_v4(),
            container_id: "recaptcha-container".to_string(),
            site_key: "site-key".to_string(),
            widget_id: "widget-1".to_string(),
        };

        let err = adapter.send_otp("+919876543210", &challenge).await.unwrap_err();
        assert_eq!(err.code, ProviderErrorCode::CaptchaCheckFailed);
    }

    #[tokio::test]
    async fn test_fetch_id_token_returns_credential_token() {
        let client = Arc::new(FirebaseAuthClient::new("test-key".to_string()));
        let adapter = FirebaseAdapter::new(client, Arc::new(FailingWidget));
        let credential = Credential {
            uid: Some("uid-1".to_string()),
            id_token: "token-abc".to_string(),
        };

        let token = adapter.fetch_id_token(&credential).await.unwrap();
        assert_eq!(token, "token-abc");
    }
}
