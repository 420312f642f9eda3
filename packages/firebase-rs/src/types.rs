use serde::{Deserialize, Serialize};

/// Request body for `accounts:sendVerificationCode`.
#[derive(Debug, Clone, Serialize)]
pub struct SendVerificationCodeRequest {
    #[serde(rename = "phoneNumber")]
    pub phone_number: String,
    #[serde(rename = "recaptchaToken")]
    pub recaptcha_token: String,
}

/// Response from `accounts:sendVerificationCode`.
#[derive(Debug, Clone, Deserialize)]
pub struct SendVerificationCodeResponse {
    #[serde(rename = "sessionInfo")]
    pub session_info: String,
}

/// Request body for `accounts:signInWithPhoneNumber`.
#[derive(Debug, Clone, Serialize)]
pub struct SignInWithPhoneNumberRequest {
    #[serde(rename = "sessionInfo")]
    pub session_info: String,
    pub code: String,
}

/// Response from `accounts:signInWithPhoneNumber`.
#[derive(Debug, Clone, Deserialize)]
pub struct SignInWithPhoneNumberResponse {
    #[serde(rename = "idToken")]
    pub id_token: String,
    #[serde(rename = "refreshToken")]
    pub refresh_token: Option<String>,
    #[serde(rename = "expiresIn")]
    pub expires_in: Option<String>,
    #[serde(rename = "localId")]
    pub local_id: Option<String>,
    #[serde(rename = "phoneNumber")]
    pub phone_number: Option<String>,
    #[serde(rename = "isNewUser")]
    pub is_new_user: Option<bool>,
}

/// Response from `recaptchaParams`.
#[derive(Debug, Clone, Deserialize)]
pub struct RecaptchaParamsResponse {
    #[serde(rename = "recaptchaSiteKey")]
    pub recaptcha_site_key: String,
}

/// Google API error envelope: `{"error": {"code": 400, "message": "..."}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub code: u16,
    pub message: String,
}
