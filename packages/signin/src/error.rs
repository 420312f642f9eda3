//! Sign-in error taxonomy and the user-facing message tables.
//!
//! Every failure a transition can hit is converted into one of these
//! variants at the transition boundary. Display strings are the messages
//! shown to the user; raw provider detail goes to the logs instead.

use thiserror::Error;

/// Generic message when an OTP send fails without a recognized code.
pub const SEND_FAILED_MESSAGE: &str = "Failed to send OTP. Please try again.";

/// Generic message when an OTP verification fails without a recognized code.
pub const VERIFY_FAILED_MESSAGE: &str = "OTP verification failed. Please try again.";

/// Machine codes reported by the phone-auth provider that drive special
/// handling in the sign-in flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorCode {
    InvalidPhoneNumber,
    TooManyRequests,
    QuotaExceeded,
    CaptchaCheckFailed,
    OperationNotAllowed,
    NetworkRequestFailed,
    InternalError,
    InvalidVerificationCode,
    CodeExpired,
    CredentialAlreadyInUse,
    Unknown,
}

impl ProviderErrorCode {
    /// Parse a provider code string, e.g. "auth/invalid-phone-number".
    pub fn parse(code: &str) -> Self {
        match code {
            "auth/invalid-phone-number" => ProviderErrorCode::InvalidPhoneNumber,
            "auth/too-many-requests" => ProviderErrorCode::TooManyRequests,
            "auth/quota-exceeded" => ProviderErrorCode::QuotaExceeded,
            "auth/captcha-check-failed" => ProviderErrorCode::CaptchaCheckFailed,
            "auth/operation-not-allowed" => ProviderErrorCode::OperationNotAllowed,
            "auth/network-request-failed" => ProviderErrorCode::NetworkRequestFailed,
            "auth/internal-error" => ProviderErrorCode::InternalError,
            "auth/invalid-verification-code" => ProviderErrorCode::InvalidVerificationCode,
            "auth/code-expired" => ProviderErrorCode::CodeExpired,
            "auth/credential-already-in-use" => ProviderErrorCode::CredentialAlreadyInUse,
            _ => ProviderErrorCode::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderErrorCode::InvalidPhoneNumber => "auth/invalid-phone-number",
            ProviderErrorCode::TooManyRequests => "auth/too-many-requests",
            ProviderErrorCode::QuotaExceeded => "auth/quota-exceeded",
            ProviderErrorCode::CaptchaCheckFailed => "auth/captcha-check-failed",
            ProviderErrorCode::OperationNotAllowed => "auth/operation-not-allowed",
            ProviderErrorCode::NetworkRequestFailed => "auth/network-request-failed",
            ProviderErrorCode::InternalError => "auth/internal-error",
            ProviderErrorCode::InvalidVerificationCode => "auth/invalid-verification-code",
            ProviderErrorCode::CodeExpired => "auth/code-expired",
            ProviderErrorCode::CredentialAlreadyInUse => "auth/credential-already-in-use",
            ProviderErrorCode::Unknown => "auth/unknown",
        }
    }

    /// Codes that poison the active bot-check challenge. Reusing the
    /// challenge after one of these fails every subsequent attempt, so the
    /// manager must destroy it and create a fresh one.
    pub fn poisons_challenge(&self) -> bool {
        matches!(
            self,
            ProviderErrorCode::CaptchaCheckFailed | ProviderErrorCode::InternalError
        )
    }

    /// User-facing message when this code aborts an OTP send.
    pub fn send_message(&self) -> &'static str {
        match self {
            ProviderErrorCode::InvalidPhoneNumber => {
                "Invalid phone number format. Please check and try again."
            }
            ProviderErrorCode::TooManyRequests => "Too many attempts. Please try again later.",
            ProviderErrorCode::QuotaExceeded => {
                "We're experiencing high demand. Please try again in a few minutes."
            }
            ProviderErrorCode::CaptchaCheckFailed => "Security check failed. Please try again.",
            ProviderErrorCode::OperationNotAllowed => {
                "Phone sign-in is not enabled. Please contact support."
            }
            ProviderErrorCode::NetworkRequestFailed => {
                "Network error. Please check your connection and try again."
            }
            ProviderErrorCode::InternalError => {
                "Authentication service error. Please refresh the page and try again."
            }
            _ => SEND_FAILED_MESSAGE,
        }
    }

    /// User-facing message when this code aborts an OTP verification.
    pub fn verify_message(&self) -> &'static str {
        match self {
            ProviderErrorCode::InvalidVerificationCode => {
                "Invalid verification code. Please check and try again."
            }
            ProviderErrorCode::CodeExpired => {
                "Verification code has expired. Please request a new one."
            }
            ProviderErrorCode::CredentialAlreadyInUse => {
                "This phone number is already associated with another account."
            }
            ProviderErrorCode::NetworkRequestFailed => {
                "Network error. Please check your connection and try again."
            }
            ProviderErrorCode::InternalError => "Verification service error. Please try again.",
            _ => VERIFY_FAILED_MESSAGE,
        }
    }
}

impl std::fmt::Display for ProviderErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Failure from the phone-auth provider, tagged with its machine code.
#[derive(Debug, Clone, Error)]
#[error("{code}: {message}")]
pub struct ProviderError {
    pub code: ProviderErrorCode,
    pub message: String,
}

impl ProviderError {
    pub fn new(code: ProviderErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Errors surfaced by the sign-in controller. Display strings are the
/// user-facing messages; none of these is a crash path.
#[derive(Debug, Error)]
pub enum SignInError {
    /// Local input validation failed; no network call was made.
    #[error("{message}")]
    Validation {
        field: &'static str,
        message: &'static str,
    },

    /// The bot-check challenge is not ready; the action was blocked before
    /// any network call.
    #[error("Security verification is not ready. Please refresh the page.")]
    ChallengeNotReady,

    /// The bot-check challenge failed to initialize.
    #[error("Security verification failed to load. Please refresh.")]
    ChallengeInit(#[source] ProviderError),

    /// The phone-auth provider rejected a call.
    #[error("{message}")]
    Provider {
        code: ProviderErrorCode,
        message: &'static str,
    },

    /// The application backend answered non-success; its message passes
    /// through verbatim.
    #[error("{0}")]
    Backend(String),

    /// No pending confirmation exists for the entered code.
    #[error("OTP session expired. Please request a new code.")]
    SessionExpired,

    /// A send or verify is already in flight.
    #[error("Another request is already in progress. Please wait.")]
    Busy,

    /// The operation is not valid in the current step.
    #[error("This action is not available right now.")]
    InvalidStep,

    /// Writing the session record failed.
    #[error("Failed to save your session. Please try again.")]
    Storage(#[source] anyhow::Error),

    /// The session task has stopped and no longer accepts commands.
    #[error("Sign-in session is closed.")]
    SessionClosed,
}

impl SignInError {
    /// Wrap a provider failure that aborted an OTP send.
    pub fn provider_send(err: &ProviderError) -> Self {
        SignInError::Provider {
            code: err.code,
            message: err.code.send_message(),
        }
    }

    /// Wrap a provider failure that aborted an OTP verification.
    pub fn provider_verify(err: &ProviderError) -> Self {
        SignInError::Provider {
            code: err.code,
            message: err.code.verify_message(),
        }
    }
}
