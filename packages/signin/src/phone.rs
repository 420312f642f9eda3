//! Phone number validation and formatting.

use crate::error::SignInError;

/// Country calling code prepended when submitting to the phone-auth
/// provider.
const COUNTRY_PREFIX: &str = "+91";

/// A validated 10-digit subscriber number.
///
/// Validation runs before any network call: exactly ten digits, leading
/// digit in 6..=9.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    pub fn parse(input: &str) -> Result<Self, SignInError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(SignInError::Validation {
                field: "phone",
                message: "Phone number is required",
            });
        }

        let digits_ok = trimmed.len() == 10 && trimmed.chars().all(|c| c.is_ascii_digit());
        let leading_ok = matches!(trimmed.chars().next(), Some('6'..='9'));
        if !digits_ok || !leading_ok {
            return Err(SignInError::Validation {
                field: "phone",
                message: "Please enter a valid 10-digit phone number",
            });
        }

        Ok(Self(trimmed.to_string()))
    }

    /// The bare 10-digit national number.
    pub fn national(&self) -> &str {
        &self.0
    }

    /// International form submitted to the phone-auth provider.
    pub fn international(&self) -> String {
        format!("{}{}", COUNTRY_PREFIX, self.0)
    }
}

impl std::fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_number() {
        let phone = PhoneNumber::parse("9876543210").expect("should parse");
        assert_eq!(phone.national(), "9876543210");
        assert_eq!(phone.international(), "+919876543210");
    }

    #[test]
    fn test_trims_whitespace() {
        let phone = PhoneNumber::parse("  7000000001 ").expect("should parse");
        assert_eq!(phone.national(), "7000000001");
    }

    #[test]
    fn test_empty_is_required_error() {
        let err = PhoneNumber::parse("   ").unwrap_err();
        assert_eq!(err.to_string(), "Phone number is required");
    }

    #[test]
    fn test_invalid_leading_digit() {
        let err = PhoneNumber::parse("1234567890").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Please enter a valid 10-digit phone number"
        );
    }

    #[test]
    fn test_wrong_length() {
        assert!(PhoneNumber::parse("98765").is_err());
        assert!(PhoneNumber::parse("98765432100").is_err());
    }

    #[test]
    fn test_non_digits_rejected() {
        assert!(PhoneNumber::parse("98765abc10").is_err());
        assert!(PhoneNumber::parse("+919876543210").is_err());
    }
}
