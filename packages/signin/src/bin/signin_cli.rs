//! Interactive phone sign-in client.
//!
//! Drives the full flow against a running backend and the Firebase Auth
//! emulator (set FIREBASE_AUTH_BASE_URL to the emulator's identitytoolkit
//! endpoint; the emulator accepts any reCAPTCHA token).

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use console::style;
use dialoguer::{theme::ColorfulTheme, Input};
use firebase::FirebaseAuthClient;
use signin_core::backend::BackendClient;
use signin_core::controller::{SignInController, SignInStep};
use signin_core::deps::{FirebaseAdapter, SignInDeps};
use signin_core::driver::SignInDriver;
use signin_core::store::FileSessionStore;
use signin_core::traits::BaseChallengeWidget;
use signin_core::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Headless stand-in for the browser bot-check widget. The emulator
/// accepts any token, so a fixed one is enough for development.
struct DevChallengeWidget {
    token: String,
}

#[async_trait]
impl BaseChallengeWidget for DevChallengeWidget {
    async fn render(&self, container_id: &str) -> Result<String> {
        Ok(format!("{container_id}-widget"))
    }

    async fn execute(&self) -> Result<String> {
        Ok(self.token.clone())
    }

    async fn clear(&self) -> Result<()> {
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,signin_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;

    let mut firebase = FirebaseAuthClient::new(config.firebase_api_key.clone());
    if let Some(base_url) = &config.firebase_base_url {
        firebase = firebase.with_base_url(base_url);
    }
    let widget = Arc::new(DevChallengeWidget {
        token: env::var("RECAPTCHA_TOKEN").unwrap_or_else(|_| "dev-token".to_string()),
    });
    let phone_auth = Arc::new(FirebaseAdapter::new(Arc::new(firebase), widget));
    let backend = Arc::new(BackendClient::new(config.api_url.clone()));
    let store = match &config.session_file {
        Some(path) => FileSessionStore::at_path(PathBuf::from(path)),
        None => FileSessionStore::new()?,
    };
    let store_path = store.path().to_path_buf();

    let deps = SignInDeps::new(phone_auth, backend, Arc::new(store));
    let controller = SignInController::new(deps, config.recaptcha_container_id.clone());
    let mut driver = SignInDriver::spawn(controller);

    println!("{}", style("Farmer Sign-In").cyan().bold());
    println!();

    // The first published snapshot follows challenge preparation.
    if driver.changed().await.is_err() {
        anyhow::bail!("Sign-in session ended before startup");
    }
    if !driver.snapshot().challenge_ready {
        println!(
            "{}",
            style("Security verification is not ready yet. Type 'restart' at the code prompt to retry.")
                .yellow()
        );
    }

    let record = 'session: loop {
        // Collect the phone number.
        loop {
            let input: String = Input::with_theme(&ColorfulTheme::default())
                .with_prompt("Phone number (10 digits)")
                .interact_text()?;
            match driver.submit_phone(input.trim()).await {
                Ok(()) => break,
                Err(e) => println!("{}", style(e).red()),
            }
        }

        // The snapshot carrying the profile is published after the reply;
        // wait for it before greeting.
        let name = loop {
            let snapshot = driver.snapshot();
            if snapshot.step == SignInStep::CollectingOtp {
                break snapshot.profile_name.unwrap_or_else(|| "farmer".to_string());
            }
            if driver.changed().await.is_err() {
                anyhow::bail!("Sign-in session ended unexpectedly");
            }
        };
        println!(
            "{}",
            style(format!("Account found for {name}. OTP sent.")).green()
        );

        // Collect and verify the code.
        loop {
            let snapshot = driver.snapshot();
            if snapshot.step == SignInStep::CollectingPhone {
                // A stale confirmation forced the flow back to phone entry.
                continue 'session;
            }
            let prompt = if snapshot.cooldown_remaining > 0 {
                format!(
                    "Code ('resend' in {}s, 'restart')",
                    snapshot.cooldown_remaining
                )
            } else {
                "Code ('resend', 'restart')".to_string()
            };
            let entry: String = Input::with_theme(&ColorfulTheme::default())
                .with_prompt(prompt)
                .interact_text()?;

            match entry.trim() {
                "resend" => match driver.resend_otp().await {
                    Ok(true) => println!("{}", style("OTP resent successfully!").green()),
                    Ok(false) => {
                        let remaining = driver.snapshot().cooldown_remaining;
                        println!(
                            "{}",
                            style(format!("Please wait {remaining}s before resending.")).yellow()
                        );
                    }
                    Err(e) => println!("{}", style(e).red()),
                },
                "restart" => {
                    if let Err(e) = driver.restart().await {
                        println!("{}", style(e).red());
                    }
                    continue 'session;
                }
                code => {
                    match driver.paste_otp(code).await {
                        Ok(true) => {}
                        Ok(false) => {
                            println!(
                                "{}",
                                style("Please enter all 6 digits of the verification code").red()
                            );
                            continue;
                        }
                        Err(e) => {
                            println!("{}", style(e).red());
                            continue;
                        }
                    }
                    match driver.verify_otp().await {
                        Ok(record) => break 'session record,
                        Err(e) => println!("{}", style(e).red()),
                    }
                }
            }
        }
    };

    let name = record.profile.name.as_deref().unwrap_or("farmer");
    println!();
    println!("{}", style(format!("Welcome back, {name}!")).green().bold());
    println!("Session saved to {}", store_path.display());

    driver.shutdown().await;
    Ok(())
}
