//! Session persistence at the end of a successful sign-in.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::traits::BaseSessionStore;
use crate::types::SessionRecord;

/// Storage key for the backend session token.
pub const SESSION_TOKEN_KEY: &str = "farmerToken";

/// Storage key for the cached profile record.
pub const PROFILE_KEY: &str = "currentFarmer";

/// Writes the terminal sign-in result to durable client storage.
pub struct SessionPersister {
    store: Arc<dyn BaseSessionStore>,
}

impl SessionPersister {
    pub fn new(store: Arc<dyn BaseSessionStore>) -> Self {
        Self { store }
    }

    /// Store the session token and profile under their well-known keys,
    /// replacing any prior record in full.
    pub async fn persist(&self, record: &SessionRecord) -> Result<()> {
        self.store
            .put(SESSION_TOKEN_KEY, &record.session_token)
            .await
            .context("Failed to store session token")?;

        let profile_json =
            serde_json::to_string(&record.profile).context("Failed to serialize profile")?;
        self.store
            .put(PROFILE_KEY, &profile_json)
            .await
            .context("Failed to store profile")?;

        info!(signed_in_at = %record.signed_in_at, "Session persisted");
        Ok(())
    }
}
