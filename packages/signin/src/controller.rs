//! Two-step phone sign-in state machine.
//!
//! The controller owns all per-session state: the current step, the
//! validated phone number, the OTP entry buffer, the pending provider
//! confirmation, the resend cooldown, and the bot-check challenge
//! lifecycle. Every transition validates locally first, then checks
//! challenge readiness, then makes network calls, then commits the state
//! change. A failure at any point reverts the step so the caller is never
//! left in a transient state.

use tracing::{debug, info, warn};

use crate::backend::BackendError;
use crate::challenge::ChallengeManager;
use crate::deps::SignInDeps;
use crate::error::{SignInError, SEND_FAILED_MESSAGE, VERIFY_FAILED_MESSAGE};
use crate::otp::OtpBuffer;
use crate::phone::PhoneNumber;
use crate::session::SessionPersister;
use crate::types::{PendingConfirmation, Profile, SessionRecord};

/// Seconds a user must wait between OTP sends.
pub const RESEND_COOLDOWN_SECS: u32 = 60;

/// Where the sign-in flow currently is. `SendingOtp` and `VerifyingOtp`
/// are transient busy steps; re-entrant calls are rejected while in them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignInStep {
    CollectingPhone,
    SendingOtp,
    CollectingOtp,
    VerifyingOtp,
    Authenticated,
}

/// Resend cooldown, decremented once per second with a floor at zero.
#[derive(Debug, Default)]
pub struct Cooldown {
    remaining: u32,
}

impl Cooldown {
    pub fn start(&mut self) {
        self.remaining = RESEND_COOLDOWN_SECS;
    }

    pub fn clear(&mut self) {
        self.remaining = 0;
    }

    pub fn tick(&mut self) {
        self.remaining = self.remaining.saturating_sub(1);
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_elapsed(&self) -> bool {
        self.remaining == 0
    }
}

pub struct SignInController {
    deps: SignInDeps,
    challenge: ChallengeManager,
    persister: SessionPersister,
    step: SignInStep,
    phone: Option<PhoneNumber>,
    profile: Option<Profile>,
    otp: OtpBuffer,
    pending: Option<PendingConfirmation>,
    cooldown: Cooldown,
    reinit_scheduled: bool,
}

impl SignInController {
    pub fn new(deps: SignInDeps, container_id: impl Into<String>) -> Self {
        let challenge = ChallengeManager::new(deps.phone_auth.clone(), container_id);
        let persister = SessionPersister::new(deps.session_store.clone());
        Self {
            deps,
            challenge,
            persister,
            step: SignInStep::CollectingPhone,
            phone: None,
            profile: None,
            otp: OtpBuffer::new(),
            pending: None,
            cooldown: Cooldown::default(),
            reinit_scheduled: false,
        }
    }

    pub fn step(&self) -> SignInStep {
        self.step
    }

    pub fn cooldown_remaining(&self) -> u32 {
        self.cooldown.remaining()
    }

    pub fn phone(&self) -> Option<&PhoneNumber> {
        self.phone.as_ref()
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    pub fn otp(&self) -> &OtpBuffer {
        &self.otp
    }

    pub fn challenge(&self) -> &ChallengeManager {
        &self.challenge
    }

    /// Prepare the bot-check challenge ahead of the first send.
    pub async fn prepare_challenge(&mut self) -> Result<(), SignInError> {
        self.challenge.ensure_ready().await.map(|_| ())
    }

    /// Validate the phone number, check it against the backend, and send
    /// the OTP. On success the flow moves to `CollectingOtp` with a fresh
    /// confirmation and a full cooldown.
    pub async fn submit_phone(&mut self, input: &str) -> Result<(), SignInError> {
        match self.step {
            SignInStep::CollectingPhone => {}
            SignInStep::SendingOtp | SignInStep::VerifyingOtp => return Err(SignInError::Busy),
            SignInStep::CollectingOtp | SignInStep::Authenticated => {
                return Err(SignInError::InvalidStep)
            }
        }

        let phone = PhoneNumber::parse(input)?;
        if !self.challenge.is_ready() {
            return Err(SignInError::ChallengeNotReady);
        }

        self.step = SignInStep::SendingOtp;
        match self.send_sequence(&phone).await {
            Ok((profile, confirmation)) => {
                info!(phone = %phone, "OTP sent");
                self.phone = Some(phone);
                self.profile = Some(profile);
                self.pending = Some(confirmation);
                self.otp.clear();
                self.cooldown.start();
                self.step = SignInStep::CollectingOtp;
                Ok(())
            }
            Err(e) => {
                self.step = SignInStep::CollectingPhone;
                Err(e)
            }
        }
    }

    /// Re-send the OTP to the stored phone number once the cooldown has
    /// elapsed. Returns `Ok(false)` while the cooldown is still running;
    /// the call must not queue or double-fire.
    pub async fn resend_otp(&mut self) -> Result<bool, SignInError> {
        match self.step {
            SignInStep::CollectingOtp => {}
            SignInStep::SendingOtp | SignInStep::VerifyingOtp => return Err(SignInError::Busy),
            SignInStep::CollectingPhone | SignInStep::Authenticated => {
                return Err(SignInError::InvalidStep)
            }
        }

        if !self.cooldown.is_elapsed() {
            debug!(
                remaining = self.cooldown.remaining(),
                "Resend blocked by cooldown"
            );
            return Ok(false);
        }

        let phone = match &self.phone {
            Some(p) => p.clone(),
            None => {
                warn!("Resend requested without a stored phone number");
                self.force_restart_to_phone();
                return Err(SignInError::SessionExpired);
            }
        };
        if !self.challenge.is_ready() {
            return Err(SignInError::ChallengeNotReady);
        }

        self.step = SignInStep::SendingOtp;
        match self.send_sequence(&phone).await {
            Ok((profile, confirmation)) => {
                info!(phone = %phone, "OTP re-sent");
                self.profile = Some(profile);
                self.pending = Some(confirmation);
                self.otp.clear();
                self.cooldown.start();
                self.step = SignInStep::CollectingOtp;
                Ok(true)
            }
            Err(e) => {
                // The previous confirmation stays valid; the user may still
                // enter the earlier code.
                self.step = SignInStep::CollectingOtp;
                Err(e)
            }
        }
    }

    /// Write one OTP entry cell. Non-digits are ignored by the buffer.
    pub fn edit_otp_digit(&mut self, index: usize, value: &str) -> Result<(), SignInError> {
        self.guard_otp_entry()?;
        self.otp.set_digit(index, value);
        Ok(())
    }

    /// Paste a full code into the buffer. Returns whether the buffer
    /// changed (only an exact 6-digit paste is accepted).
    pub fn paste_otp(&mut self, text: &str) -> Result<bool, SignInError> {
        self.guard_otp_entry()?;
        Ok(self.otp.paste(text))
    }

    /// Confirm the entered code with the provider, then exchange the
    /// identity token with the backend, then persist the session.
    pub async fn verify_otp(&mut self) -> Result<SessionRecord, SignInError> {
        match self.step {
            SignInStep::CollectingOtp => {}
            SignInStep::SendingOtp | SignInStep::VerifyingOtp => return Err(SignInError::Busy),
            SignInStep::CollectingPhone | SignInStep::Authenticated => {
                return Err(SignInError::InvalidStep)
            }
        }

        let code = match self.otp.code() {
            Some(code) => code,
            None => {
                return Err(SignInError::Validation {
                    field: "otp",
                    message: "Please enter all 6 digits of the verification code",
                })
            }
        };
        let confirmation = match &self.pending {
            Some(pending) => pending.clone(),
            None => {
                warn!("Verify requested without a pending confirmation");
                self.force_restart_to_phone();
                return Err(SignInError::SessionExpired);
            }
        };
        let phone = match &self.phone {
            Some(p) => p.clone(),
            None => {
                warn!("Verify requested without a stored phone number");
                self.force_restart_to_phone();
                return Err(SignInError::SessionExpired);
            }
        };

        self.step = SignInStep::VerifyingOtp;
        match self.verify_sequence(&phone, &confirmation, &code).await {
            Ok(record) => {
                info!(phone = %phone, "Sign-in complete");
                self.pending = None;
                self.otp.clear();
                self.cooldown.clear();
                self.step = SignInStep::Authenticated;
                Ok(record)
            }
            Err(e) => {
                // The confirmation is kept so the user can correct the code
                // and retry without a re-send.
                self.step = SignInStep::CollectingOtp;
                Err(e)
            }
        }
    }

    /// Abandon the current attempt and return to phone entry. The
    /// challenge is destroyed and re-created so the next send starts from
    /// a clean widget.
    pub async fn restart(&mut self) -> Result<(), SignInError> {
        if self.step == SignInStep::Authenticated {
            return Err(SignInError::InvalidStep);
        }
        info!("Sign-in restarted");
        self.phone = None;
        self.profile = None;
        self.otp.clear();
        self.pending = None;
        self.cooldown.clear();
        self.reinit_scheduled = false;
        self.step = SignInStep::CollectingPhone;

        self.challenge.invalidate().await;
        if let Err(e) = self.challenge.ensure_ready().await {
            self.reinit_scheduled = true;
            return Err(e);
        }
        Ok(())
    }

    /// One-second timer callback: advances the cooldown and performs any
    /// scheduled challenge re-creation.
    pub async fn tick(&mut self) {
        self.cooldown.tick();
        if self.reinit_scheduled {
            self.reinit_scheduled = false;
            if let Err(e) = self.challenge.ensure_ready().await {
                warn!(error = %e, "Challenge re-creation failed, will retry");
                self.reinit_scheduled = true;
            }
        }
    }

    /// Release per-attempt resources when the flow is abandoned. The step
    /// is left untouched; a verify arriving after teardown fails with
    /// `SessionExpired` instead of resurrecting the attempt.
    pub async fn teardown(&mut self) {
        self.challenge.invalidate().await;
        self.pending = None;
        self.otp.clear();
        self.cooldown.clear();
        debug!("Sign-in controller torn down");
    }

    fn guard_otp_entry(&self) -> Result<(), SignInError> {
        match self.step {
            SignInStep::CollectingOtp => Ok(()),
            SignInStep::SendingOtp | SignInStep::VerifyingOtp => Err(SignInError::Busy),
            SignInStep::CollectingPhone | SignInStep::Authenticated => {
                Err(SignInError::InvalidStep)
            }
        }
    }

    fn force_restart_to_phone(&mut self) {
        self.otp.clear();
        self.pending = None;
        self.cooldown.clear();
        self.step = SignInStep::CollectingPhone;
    }

    /// Backend check, then OTP dispatch bound to the active challenge.
    /// Ordinary send failures leave the challenge intact; poisoning codes
    /// destroy it and schedule a re-creation on the next tick.
    async fn send_sequence(
        &mut self,
        phone: &PhoneNumber,
    ) -> Result<(Profile, PendingConfirmation), SignInError> {
        let profile = self
            .deps
            .backend
            .check_phone(phone.national())
            .await
            .map_err(|e| map_backend_error(e, SEND_FAILED_MESSAGE))?;

        let challenge = self
            .challenge
            .current()
            .cloned()
            .ok_or(SignInError::ChallengeNotReady)?;

        match self
            .deps
            .phone_auth
            .send_otp(&phone.international(), &challenge)
            .await
        {
            Ok(confirmation) => Ok((profile, confirmation)),
            Err(e) => {
                warn!(code = %e.code, error = %e, "OTP send failed");
                if e.code.poisons_challenge() {
                    self.challenge.invalidate().await;
                    self.reinit_scheduled = true;
                }
                Err(SignInError::provider_send(&e))
            }
        }
    }

    /// Provider confirm, token fetch, backend verify, session persist.
    async fn verify_sequence(
        &self,
        phone: &PhoneNumber,
        confirmation: &PendingConfirmation,
        code: &str,
    ) -> Result<SessionRecord, SignInError> {
        let credential = self
            .deps
            .phone_auth
            .confirm_otp(confirmation, code)
            .await
            .map_err(|e| {
                warn!(code = %e.code, error = %e, "OTP confirmation failed");
                SignInError::provider_verify(&e)
            })?;

        let id_token = self
            .deps
            .phone_auth
            .fetch_id_token(&credential)
            .await
            .map_err(|e| {
                warn!(code = %e.code, error = %e, "Identity token fetch failed");
                SignInError::provider_verify(&e)
            })?;

        let grant = self
            .deps
            .backend
            .verify_otp(phone.national(), &id_token)
            .await
            .map_err(|e| map_backend_error(e, VERIFY_FAILED_MESSAGE))?;

        let record = SessionRecord {
            session_token: grant.token,
            profile: grant.farmer,
            signed_in_at: chrono::Utc::now(),
        };
        self.persister
            .persist(&record)
            .await
            .map_err(SignInError::Storage)?;
        Ok(record)
    }
}

fn map_backend_error(err: BackendError, fallback: &'static str) -> SignInError {
    match err {
        BackendError::Rejected(message) => SignInError::Backend(message),
        other => {
            warn!(error = %other, "Backend request failed");
            SignInError::Backend(fallback.to_string())
        }
    }
}
