//! Bot-check challenge lifecycle.
//!
//! The manager owns the single active challenge per UI container: created
//! lazily, reused across sends, destroyed and re-created when a provider
//! error poisons it. Creation is only reachable through `ensure_ready`, so
//! a second concurrent challenge in the same container cannot exist.

use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::SignInError;
use crate::traits::BasePhoneAuthService;

/// Opaque handle to an active bot-verification challenge, scoped to one
/// UI container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    pub id: Uuid,
    pub container_id: String,
    pub site_key: String,
    pub widget_id: String,
}

pub struct ChallengeManager {
    provider: Arc<dyn BasePhoneAuthService>,
    container_id: String,
    current: Option<Challenge>,
}

impl ChallengeManager {
    pub fn new(provider: Arc<dyn BasePhoneAuthService>, container_id: impl Into<String>) -> Self {
        Self {
            provider,
            container_id: container_id.into(),
            current: None,
        }
    }

    /// Prepare a challenge bound to the container. Idempotent: returns the
    /// existing handle untouched when one is active, creates exactly one
    /// otherwise.
    pub async fn ensure_ready(&mut self) -> Result<Challenge, SignInError> {
        if let Some(challenge) = &self.current {
            debug!(challenge_id = %challenge.id, "Challenge already active");
            return Ok(challenge.clone());
        }

        let challenge = self
            .provider
            .create_challenge(&self.container_id)
            .await
            .map_err(SignInError::ChallengeInit)?;
        info!(
            challenge_id = %challenge.id,
            container = %self.container_id,
            "Challenge created"
        );
        self.current = Some(challenge.clone());
        Ok(challenge)
    }

    /// Destroy the current challenge, if any. Best effort: a provider
    /// failure still drops the handle so the next `ensure_ready` starts
    /// clean. No-op when no challenge exists.
    pub async fn invalidate(&mut self) {
        if let Some(challenge) = self.current.take() {
            match self.provider.destroy_challenge(&challenge).await {
                Ok(()) => info!(challenge_id = %challenge.id, "Challenge destroyed"),
                Err(e) => {
                    warn!(challenge_id = %challenge.id, error = %e, "Failed to destroy challenge")
                }
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        self.current.is_some()
    }

    /// The active challenge handle, if one exists.
    pub fn current(&self) -> Option<&Challenge> {
        self.current.as_ref()
    }

    pub fn container_id(&self) -> &str {
        &self.container_id
    }
}
