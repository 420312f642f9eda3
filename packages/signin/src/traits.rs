// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// The sign-in transition rules live in the controller and use these traits.
//
// Naming convention: Base* for trait names (e.g., BasePhoneAuthService)

use anyhow::Result;
use async_trait::async_trait;

use crate::backend::BackendError;
use crate::challenge::Challenge;
use crate::error::ProviderError;
use crate::types::{Credential, PendingConfirmation, Profile, SessionGrant};

// =============================================================================
// Phone Auth Provider Trait (Infrastructure - challenges, OTP dispatch/check)
// =============================================================================

#[async_trait]
pub trait BasePhoneAuthService: Send + Sync {
    /// Create a bot-check challenge bound to a UI container.
    async fn create_challenge(&self, container_id: &str) -> Result<Challenge, ProviderError>;

    /// Destroy a previously created challenge, releasing provider-side
    /// resources.
    async fn destroy_challenge(&self, challenge: &Challenge) -> Result<(), ProviderError>;

    /// Dispatch an OTP to an international phone number, bound to the given
    /// challenge. Returns the confirmation handle for the later check.
    async fn send_otp(
        &self,
        international_phone: &str,
        challenge: &Challenge,
    ) -> Result<PendingConfirmation, ProviderError>;

    /// Check an OTP code against a pending confirmation.
    async fn confirm_otp(
        &self,
        confirmation: &PendingConfirmation,
        code: &str,
    ) -> Result<Credential, ProviderError>;

    /// Exchange a credential for a bearer identity token.
    async fn fetch_id_token(&self, credential: &Credential) -> Result<String, ProviderError>;
}

// =============================================================================
// Application Backend Trait (Infrastructure)
// =============================================================================

#[async_trait]
pub trait BaseBackendService: Send + Sync {
    /// Check that a phone number belongs to a registered, eligible account.
    /// Returns the account profile on success.
    async fn check_phone(&self, phone: &str) -> Result<Profile, BackendError>;

    /// Exchange a verified identity token for a session grant.
    async fn verify_otp(&self, phone: &str, id_token: &str)
        -> Result<SessionGrant, BackendError>;
}

// =============================================================================
// Session Store Trait (Infrastructure - durable client storage)
// =============================================================================

#[async_trait]
pub trait BaseSessionStore: Send + Sync {
    /// Store a value under a well-known key, replacing any prior value.
    async fn put(&self, key: &str, value: &str) -> Result<()>;
}

// =============================================================================
// Challenge Widget Trait (Infrastructure - embedder-supplied bot check)
// =============================================================================

/// The invisible bot-check widget living in the UI container. The widget
/// produces the short-lived tokens consumed by OTP sends; the verification
/// algorithm itself belongs to the embedder.
#[async_trait]
pub trait BaseChallengeWidget: Send + Sync {
    /// Render the widget into the container and return its widget id.
    async fn render(&self, container_id: &str) -> Result<String>;

    /// Run the bot check and produce a one-time token.
    async fn execute(&self) -> Result<String>;

    /// Remove the widget from the container.
    async fn clear(&self) -> Result<()>;
}
