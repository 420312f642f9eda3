// Mock implementations for testing
//
// Provides mock services that can be injected into SignInDeps for tests.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::backend::BackendError;
use crate::challenge::Challenge;
use crate::error::{ProviderError, ProviderErrorCode};
use crate::traits::{BaseBackendService, BasePhoneAuthService, BaseSessionStore};
use crate::types::{Credential, PendingConfirmation, Profile, SessionGrant};

/// Build a profile with only the display name set.
pub fn profile_named(name: &str) -> Profile {
    Profile {
        name: Some(name.to_string()),
        extra: serde_json::Map::new(),
    }
}

// =============================================================================
// Mock Phone Auth Service
// =============================================================================

/// Arguments captured from a send call
#[derive(Debug, Clone)]
pub struct SendCallArgs {
    pub phone: String,
    pub challenge_id: Uuid,
}

/// Arguments captured from a confirm call
#[derive(Debug, Clone)]
pub struct ConfirmCallArgs {
    pub session_info: String,
    pub code: String,
}

pub struct MockPhoneAuthService {
    create_failures: Arc<Mutex<Vec<ProviderError>>>,
    send_results: Arc<Mutex<Vec<Result<(), ProviderError>>>>,
    confirm_failures: Arc<Mutex<Vec<ProviderError>>>,
    hang_sends: Arc<Mutex<bool>>,
    hang_confirms: Arc<Mutex<bool>>,
    accepted_code: Arc<Mutex<String>>,
    send_counter: Arc<Mutex<u64>>,
    create_calls: Arc<Mutex<Vec<String>>>,
    destroy_count: Arc<Mutex<usize>>,
    send_calls: Arc<Mutex<Vec<SendCallArgs>>>,
    confirm_calls: Arc<Mutex<Vec<ConfirmCallArgs>>>,
}

impl MockPhoneAuthService {
    pub fn new() -> Self {
        Self {
            create_failures: Arc::new(Mutex::new(Vec::new())),
            send_results: Arc::new(Mutex::new(Vec::new())),
            confirm_failures: Arc::new(Mutex::new(Vec::new())),
            hang_sends: Arc::new(Mutex::new(false)),
            hang_confirms: Arc::new(Mutex::new(false)),
            accepted_code: Arc::new(Mutex::new("123456".to_string())),
            send_counter: Arc::new(Mutex::new(0)),
            create_calls: Arc::new(Mutex::new(Vec::new())),
            destroy_count: Arc::new(Mutex::new(0)),
            send_calls: Arc::new(Mutex::new(Vec::new())),
            confirm_calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queue one challenge-creation failure.
    pub fn with_create_failure(self) -> Self {
        self.create_failures.lock().unwrap().push(ProviderError::new(
            ProviderErrorCode::InternalError,
            "mock challenge creation failure",
        ));
        self
    }

    /// Queue one send success, ahead of any queued failures.
    pub fn with_send_success(self) -> Self {
        self.send_results.lock().unwrap().push(Ok(()));
        self
    }

    /// Queue one send failure with the given code.
    pub fn with_send_failure(self, code: ProviderErrorCode) -> Self {
        self.send_results
            .lock()
            .unwrap()
            .push(Err(ProviderError::new(
                code,
                format!("mock send failure: {code}"),
            )));
        self
    }

    /// Queue one confirm failure with the given code.
    pub fn with_confirm_failure(self, code: ProviderErrorCode) -> Self {
        self.confirm_failures
            .lock()
            .unwrap()
            .push(ProviderError::new(code, format!("mock confirm failure: {code}")));
        self
    }

    /// Make every send hang until the caller drops the future.
    pub fn with_hanging_send(self) -> Self {
        *self.hang_sends.lock().unwrap() = true;
        self
    }

    /// Make every confirm hang until the caller drops the future.
    pub fn with_hanging_confirm(self) -> Self {
        *self.hang_confirms.lock().unwrap() = true;
        self
    }

    /// Set the code that confirms successfully (default "123456").
    pub fn with_accepted_code(self, code: &str) -> Self {
        *self.accepted_code.lock().unwrap() = code.to_string();
        self
    }

    /// Get all container ids passed to create calls
    pub fn create_calls(&self) -> Vec<String> {
        self.create_calls.lock().unwrap().clone()
    }

    pub fn destroy_count(&self) -> usize {
        *self.destroy_count.lock().unwrap()
    }

    /// Get all send calls with their arguments
    pub fn send_calls(&self) -> Vec<SendCallArgs> {
        self.send_calls.lock().unwrap().clone()
    }

    /// Get all confirm calls with their arguments
    pub fn confirm_calls(&self) -> Vec<ConfirmCallArgs> {
        self.confirm_calls.lock().unwrap().clone()
    }
}

impl Default for MockPhoneAuthService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BasePhoneAuthService for MockPhoneAuthService {
    async fn create_challenge(&self, container_id: &str) -> Result<Challenge, ProviderError> {
        self.create_calls
            .lock()
            .unwrap()
            .push(container_id.to_string());

        let mut failures = self.create_failures.lock().unwrap();
        if !failures.is_empty() {
            return Err(failures.remove(0));
        }
        Ok(Challenge {
            id: Uuid::new_v4(),
            container_id: container_id.to_string(),
            site_key: "mock-site-key".to_string(),
            widget_id: "mock-widget".to_string(),
        })
    }

    async fn destroy_challenge(&self, _challenge: &Challenge) -> Result<(), ProviderError> {
        *self.destroy_count.lock().unwrap() += 1;
        Ok(())
    }

    async fn send_otp(
        &self,
        international_phone: &str,
        challenge: &Challenge,
    ) -> Result<PendingConfirmation, ProviderError> {
        if *self.hang_sends.lock().unwrap() {
            return std::future::pending().await;
        }
        self.send_calls.lock().unwrap().push(SendCallArgs {
            phone: international_phone.to_string(),
            challenge_id: challenge.id,
        });

        let mut results = self.send_results.lock().unwrap();
        if !results.is_empty() {
            results.remove(0)?;
        }
        let mut counter = self.send_counter.lock().unwrap();
        *counter += 1;
        Ok(PendingConfirmation {
            session_info: format!("session-{counter}"),
        })
    }

    async fn confirm_otp(
        &self,
        confirmation: &PendingConfirmation,
        code: &str,
    ) -> Result<Credential, ProviderError> {
        if *self.hang_confirms.lock().unwrap() {
            return std::future::pending().await;
        }
        self.confirm_calls.lock().unwrap().push(ConfirmCallArgs {
            session_info: confirmation.session_info.clone(),
            code: code.to_string(),
        });

        let mut failures = self.confirm_failures.lock().unwrap();
        if !failures.is_empty() {
            return Err(failures.remove(0));
        }
        if code != self.accepted_code.lock().unwrap().as_str() {
            return Err(ProviderError::new(
                ProviderErrorCode::InvalidVerificationCode,
                "mock rejected code",
            ));
        }
        Ok(Credential {
            uid: Some("mock-uid".to_string()),
            id_token: "mock-id-token".to_string(),
        })
    }

    async fn fetch_id_token(&self, credential: &Credential) -> Result<String, ProviderError> {
        Ok(credential.id_token.clone())
    }
}

// =============================================================================
// Mock Backend Service
// =============================================================================

pub struct MockBackendService {
    check_results: Arc<Mutex<Vec<Result<Profile, BackendError>>>>,
    verify_results: Arc<Mutex<Vec<Result<SessionGrant, BackendError>>>>,
    check_calls: Arc<Mutex<Vec<String>>>,
    verify_calls: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockBackendService {
    pub fn new() -> Self {
        Self {
            check_results: Arc::new(Mutex::new(Vec::new())),
            verify_results: Arc::new(Mutex::new(Vec::new())),
            check_calls: Arc::new(Mutex::new(Vec::new())),
            verify_calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queue a check-phone rejection with the given message.
    pub fn with_check_rejection(self, message: &str) -> Self {
        self.check_results
            .lock()
            .unwrap()
            .push(Err(BackendError::Rejected(message.to_string())));
        self
    }

    /// Queue a check-phone transport failure.
    pub fn with_check_network_failure(self) -> Self {
        self.check_results
            .lock()
            .unwrap()
            .push(Err(BackendError::Network("connection refused".to_string())));
        self
    }

    /// Queue a check-phone success with the given profile.
    pub fn with_check_profile(self, profile: Profile) -> Self {
        self.check_results.lock().unwrap().push(Ok(profile));
        self
    }

    /// Queue a verify-otp rejection with the given message.
    pub fn with_verify_rejection(self, message: &str) -> Self {
        self.verify_results
            .lock()
            .unwrap()
            .push(Err(BackendError::Rejected(message.to_string())));
        self
    }

    /// Queue a verify-otp success with the given grant.
    pub fn with_verify_grant(self, token: &str, profile: Profile) -> Self {
        self.verify_results.lock().unwrap().push(Ok(SessionGrant {
            token: token.to_string(),
            farmer: profile,
        }));
        self
    }

    /// Get all phone numbers passed to check calls
    pub fn check_calls(&self) -> Vec<String> {
        self.check_calls.lock().unwrap().clone()
    }

    /// Get all (phone, id_token) pairs passed to verify calls
    pub fn verify_calls(&self) -> Vec<(String, String)> {
        self.verify_calls.lock().unwrap().clone()
    }
}

impl Default for MockBackendService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseBackendService for MockBackendService {
    async fn check_phone(&self, phone: &str) -> Result<Profile, BackendError> {
        self.check_calls.lock().unwrap().push(phone.to_string());

        let mut results = self.check_results.lock().unwrap();
        if !results.is_empty() {
            return results.remove(0);
        }
        Ok(profile_named("Mock Farmer"))
    }

    async fn verify_otp(&self, phone: &str, id_token: &str) -> Result<SessionGrant, BackendError> {
        self.verify_calls
            .lock()
            .unwrap()
            .push((phone.to_string(), id_token.to_string()));

        let mut results = self.verify_results.lock().unwrap();
        if !results.is_empty() {
            return results.remove(0);
        }
        Ok(SessionGrant {
            token: "mock-session-token".to_string(),
            farmer: profile_named("Mock Farmer"),
        })
    }
}

// =============================================================================
// In-Memory Session Store
// =============================================================================

pub struct MemorySessionStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
    fail_puts: Arc<Mutex<bool>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            fail_puts: Arc::new(Mutex::new(false)),
        }
    }

    /// Make every put fail.
    pub fn with_failure(self) -> Self {
        *self.fail_puts.lock().unwrap() = true;
        self
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseSessionStore for MemorySessionStore {
    async fn put(&self, key: &str, value: &str) -> Result<()> {
        if *self.fail_puts.lock().unwrap() {
            return Err(anyhow!("mock storage failure"));
        }
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
