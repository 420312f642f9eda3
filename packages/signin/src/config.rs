use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub firebase_api_key: String,
    pub firebase_base_url: Option<String>,
    pub recaptcha_container_id: String,
    pub session_file: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            api_url: env::var("API_URL")
                .unwrap_or_else(|_| "http://localhost:5000".to_string()),
            firebase_api_key: env::var("FIREBASE_API_KEY")
                .context("FIREBASE_API_KEY must be set")?,
            firebase_base_url: env::var("FIREBASE_AUTH_BASE_URL").ok(),
            recaptcha_container_id: env::var("RECAPTCHA_CONTAINER_ID")
                .unwrap_or_else(|_| "recaptcha-container".to_string()),
            session_file: env::var("SESSION_FILE").ok(),
        })
    }
}
