//! Data records exchanged with the backend and persisted on success.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User profile returned by the backend. The name is typed because the UI
/// displays it; everything else rides along untouched since downstream
/// pages read the cached record verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Opaque handle binding an OTP confirmation to a specific send attempt.
/// Replaced wholesale by every new send; discarded on restart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingConfirmation {
    pub session_info: String,
}

/// Identity credential yielded by a successful OTP confirmation. The
/// provider exchanges it for a bearer identity token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    /// Provider-assigned user id, when the provider reports one.
    pub uid: Option<String>,
    pub id_token: String,
}

/// Session grant returned by the backend after OTP verification.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SessionGrant {
    pub token: String,
    pub farmer: Profile,
}

/// Result of a completed sign-in, persisted wholesale by the session
/// store. Never partially mutated; a later sign-in overwrites it in full.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_token: String,
    pub profile: Profile,
    pub signed_in_at: DateTime<Utc>,
}
