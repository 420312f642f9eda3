//! Session-task tests: command dispatch, ticking, and shutdown.

use std::sync::Arc;

use signin_core::controller::{SignInController, SignInStep, RESEND_COOLDOWN_SECS};
use signin_core::deps::SignInDeps;
use signin_core::driver::SignInDriver;
use signin_core::error::SignInError;
use signin_core::session::SESSION_TOKEN_KEY;
use signin_core::testing::{MemorySessionStore, MockBackendService, MockPhoneAuthService};
use tokio::time::{timeout, Duration};

const CONTAINER: &str = "recaptcha-container";
const PHONE: &str = "9876543210";
const CODE: &str = "123456";

// ============================================================================
// Test Helpers
// ============================================================================

fn spawn_driver(
    phone_auth: MockPhoneAuthService,
) -> (
    Arc<MockPhoneAuthService>,
    Arc<MemorySessionStore>,
    SignInDriver,
) {
    let phone_auth = Arc::new(phone_auth);
    let store = Arc::new(MemorySessionStore::new());
    let deps = SignInDeps::new(
        phone_auth.clone(),
        Arc::new(MockBackendService::new()),
        store.clone(),
    );
    let driver = SignInDriver::spawn(SignInController::new(deps, CONTAINER));
    (phone_auth, store, driver)
}

/// Wait until the spawned task has prepared the challenge.
async fn wait_ready(driver: &mut SignInDriver) {
    while !driver.snapshot().challenge_ready {
        driver
            .changed()
            .await
            .expect("session task should still be running");
    }
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_driver_full_flow_stops_after_authentication() {
    let (_phone_auth, store, mut driver) = spawn_driver(MockPhoneAuthService::new());
    wait_ready(&mut driver).await;

    driver.submit_phone(PHONE).await.expect("submit should succeed");

    // Snapshot publication follows the reply; wait for it.
    let snap = loop {
        let s = driver.changed().await.expect("running");
        if s.step == SignInStep::CollectingOtp {
            break s;
        }
    };
    assert_eq!(snap.cooldown_remaining, RESEND_COOLDOWN_SECS);
    assert_eq!(snap.profile_name.as_deref(), Some("Mock Farmer"));

    assert!(driver.paste_otp(CODE).await.expect("paste should succeed"));
    let record = driver.verify_otp().await.expect("verify should succeed");
    assert_eq!(record.session_token, "mock-session-token");
    assert_eq!(
        store.get(SESSION_TOKEN_KEY).as_deref(),
        Some("mock-session-token")
    );

    // The task stops after authentication; the final snapshot reports it.
    let mut saw_authenticated = false;
    loop {
        match driver.changed().await {
            Ok(snap) => saw_authenticated |= snap.authenticated,
            Err(_) => break,
        }
    }
    assert!(saw_authenticated);

    let err = driver.submit_phone(PHONE).await.unwrap_err();
    assert!(matches!(err, SignInError::SessionClosed));
}

#[tokio::test(start_paused = true)]
async fn test_resend_allowed_once_cooldown_elapses() {
    let (phone_auth, _store, mut driver) = spawn_driver(MockPhoneAuthService::new());
    wait_ready(&mut driver).await;

    driver.submit_phone(PHONE).await.expect("submit should succeed");
    assert!(!driver.resend_otp().await.expect("resend call"));
    assert_eq!(phone_auth.send_calls().len(), 1);

    // Ticks are delivered by the task's one-second interval; paused time
    // advances through them as soon as every task is idle.
    loop {
        let snap = driver.changed().await.expect("running");
        if snap.step == SignInStep::CollectingOtp && snap.cooldown_remaining == 0 {
            break;
        }
    }

    assert!(driver.resend_otp().await.expect("resend call"));
    assert_eq!(phone_auth.send_calls().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_abandons_in_flight_send() {
    let (phone_auth, _store, mut driver) =
        spawn_driver(MockPhoneAuthService::new().with_hanging_send());
    wait_ready(&mut driver).await;

    // Issue a submit whose provider send never resolves, then give up on
    // the reply, as a user navigating away would.
    let submitted = timeout(Duration::from_millis(100), driver.submit_phone(PHONE)).await;
    assert!(submitted.is_err(), "send should still be in flight");

    // Teardown must not wait for the stalled send.
    timeout(Duration::from_secs(2), driver.shutdown())
        .await
        .expect("shutdown must not block on the in-flight send");
    assert_eq!(phone_auth.destroy_count(), 1);
}

#[tokio::test]
async fn test_shutdown_tears_down_challenge() {
    let (phone_auth, _store, mut driver) = spawn_driver(MockPhoneAuthService::new());
    wait_ready(&mut driver).await;

    driver.shutdown().await;
    assert_eq!(phone_auth.destroy_count(), 1);
}

#[tokio::test]
async fn test_commands_rejected_before_otp_stage() {
    let (_phone_auth, _store, mut driver) = spawn_driver(MockPhoneAuthService::new());
    wait_ready(&mut driver).await;

    assert!(matches!(
        driver.verify_otp().await.unwrap_err(),
        SignInError::InvalidStep
    ));
    assert!(matches!(
        driver.resend_otp().await.unwrap_err(),
        SignInError::InvalidStep
    ));
    assert!(matches!(
        driver.edit_otp_digit(0, "5").await.unwrap_err(),
        SignInError::InvalidStep
    ));

    driver.shutdown().await;
}
