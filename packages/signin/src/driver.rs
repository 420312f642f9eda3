//! Async driver that owns a controller on a background task.
//!
//! All controller access is serialized through one task: commands arrive
//! over an mpsc channel, each carrying a oneshot for its result, and a
//! read-only snapshot is published over a watch channel after every
//! change. A one-second interval drives the cooldown and any scheduled
//! challenge re-creation, so at most one send or verify is ever in
//! flight.

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::controller::{SignInController, SignInStep};
use crate::error::SignInError;
use crate::types::SessionRecord;

enum SignInCommand {
    SubmitPhone {
        input: String,
        reply: oneshot::Sender<Result<(), SignInError>>,
    },
    EditOtpDigit {
        index: usize,
        value: String,
        reply: oneshot::Sender<Result<(), SignInError>>,
    },
    PasteOtp {
        text: String,
        reply: oneshot::Sender<Result<bool, SignInError>>,
    },
    ResendOtp {
        reply: oneshot::Sender<Result<bool, SignInError>>,
    },
    VerifyOtp {
        reply: oneshot::Sender<Result<SessionRecord, SignInError>>,
    },
    Restart {
        reply: oneshot::Sender<Result<(), SignInError>>,
    },
}

/// Read-only view of the controller, published after every change.
#[derive(Debug, Clone, PartialEq)]
pub struct SignInSnapshot {
    pub step: SignInStep,
    pub cooldown_remaining: u32,
    pub challenge_ready: bool,
    pub profile_name: Option<String>,
    pub authenticated: bool,
}

/// Handle to a running sign-in session task.
///
/// Dropping the handle does not stop the task; call [`shutdown`] to tear
/// the session down.
///
/// [`shutdown`]: SignInDriver::shutdown
pub struct SignInDriver {
    commands: mpsc::Sender<SignInCommand>,
    snapshots: watch::Receiver<SignInSnapshot>,
    shutdown: CancellationToken,
    handle: JoinHandle<()>,
}

impl SignInDriver {
    /// Spawn the session task. The challenge is prepared eagerly so the
    /// first `submit_phone` does not race widget initialization.
    pub fn spawn(mut controller: SignInController) -> Self {
        let (commands, mut rx) = mpsc::channel::<SignInCommand>(16);
        let (snapshot_tx, snapshots) = watch::channel(snapshot_of(&controller));
        let shutdown = CancellationToken::new();
        let cancel = shutdown.clone();

        let handle = tokio::spawn(async move {
            if let Err(e) = controller.prepare_challenge().await {
                warn!(error = %e, "Initial challenge preparation failed");
            }
            let _ = snapshot_tx.send(snapshot_of(&controller));

            let mut ticker = interval(Duration::from_secs(1));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick resolves immediately; consume it.
            ticker.tick().await;

            loop {
                // Cancellation races the whole unit of work, so an in-flight
                // send or verify is dropped instead of delaying teardown.
                let work = async {
                    tokio::select! {
                        _ = ticker.tick() => {
                            controller.tick().await;
                            false
                        }
                        cmd = rx.recv() => match cmd {
                            Some(cmd) => dispatch(&mut controller, cmd).await,
                            None => true,
                        }
                    }
                };
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    done = work => {
                        if done {
                            break;
                        }
                    }
                }
                let _ = snapshot_tx.send(snapshot_of(&controller));
            }

            controller.teardown().await;
            let _ = snapshot_tx.send(snapshot_of(&controller));
            info!("Sign-in session task stopped");
        });

        Self {
            commands,
            snapshots,
            shutdown,
            handle,
        }
    }

    pub async fn submit_phone(&self, input: &str) -> Result<(), SignInError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(SignInCommand::SubmitPhone {
                input: input.to_string(),
                reply,
            })
            .await
            .map_err(|_| SignInError::SessionClosed)?;
        rx.await.map_err(|_| SignInError::SessionClosed)?
    }

    pub async fn edit_otp_digit(&self, index: usize, value: &str) -> Result<(), SignInError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(SignInCommand::EditOtpDigit {
                index,
                value: value.to_string(),
                reply,
            })
            .await
            .map_err(|_| SignInError::SessionClosed)?;
        rx.await.map_err(|_| SignInError::SessionClosed)?
    }

    pub async fn paste_otp(&self, text: &str) -> Result<bool, SignInError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(SignInCommand::PasteOtp {
                text: text.to_string(),
                reply,
            })
            .await
            .map_err(|_| SignInError::SessionClosed)?;
        rx.await.map_err(|_| SignInError::SessionClosed)?
    }

    pub async fn resend_otp(&self) -> Result<bool, SignInError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(SignInCommand::ResendOtp { reply })
            .await
            .map_err(|_| SignInError::SessionClosed)?;
        rx.await.map_err(|_| SignInError::SessionClosed)?
    }

    /// Run the full verification sequence. On success the session task
    /// stops accepting commands; the returned record is the caller's copy.
    pub async fn verify_otp(&self) -> Result<SessionRecord, SignInError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(SignInCommand::VerifyOtp { reply })
            .await
            .map_err(|_| SignInError::SessionClosed)?;
        rx.await.map_err(|_| SignInError::SessionClosed)?
    }

    pub async fn restart(&self) -> Result<(), SignInError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(SignInCommand::Restart { reply })
            .await
            .map_err(|_| SignInError::SessionClosed)?;
        rx.await.map_err(|_| SignInError::SessionClosed)?
    }

    /// Latest published state.
    pub fn snapshot(&self) -> SignInSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Wait for the next published state change. Errors once the session
    /// task has stopped.
    pub async fn changed(&mut self) -> Result<SignInSnapshot, SignInError> {
        self.snapshots
            .changed()
            .await
            .map_err(|_| SignInError::SessionClosed)?;
        Ok(self.snapshots.borrow_and_update().clone())
    }

    /// Stop the session task and wait for teardown to finish. An
    /// in-flight send or verify is abandoned, not awaited.
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        let _ = self.handle.await;
    }
}

/// Returns true when the command completed authentication and the task
/// should stop.
async fn dispatch(controller: &mut SignInController, cmd: SignInCommand) -> bool {
    match cmd {
        SignInCommand::SubmitPhone { input, reply } => {
            let _ = reply.send(controller.submit_phone(&input).await);
        }
        SignInCommand::EditOtpDigit { index, value, reply } => {
            let _ = reply.send(controller.edit_otp_digit(index, &value));
        }
        SignInCommand::PasteOtp { text, reply } => {
            let _ = reply.send(controller.paste_otp(&text));
        }
        SignInCommand::ResendOtp { reply } => {
            let _ = reply.send(controller.resend_otp().await);
        }
        SignInCommand::VerifyOtp { reply } => {
            let result = controller.verify_otp().await;
            let authenticated = result.is_ok();
            let _ = reply.send(result);
            return authenticated;
        }
        SignInCommand::Restart { reply } => {
            let _ = reply.send(controller.restart().await);
        }
    }
    false
}

fn snapshot_of(controller: &SignInController) -> SignInSnapshot {
    SignInSnapshot {
        step: controller.step(),
        cooldown_remaining: controller.cooldown_remaining(),
        challenge_ready: controller.challenge().is_ready(),
        profile_name: controller.profile().and_then(|p| p.name.clone()),
        authenticated: controller.step() == SignInStep::Authenticated,
    }
}
