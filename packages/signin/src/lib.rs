// Phone OTP Sign-In - Core Library
//
// This crate implements the two-step phone sign-in flow: collect a phone
// number, check it with the application backend, dispatch an OTP bound to
// a bot-check challenge, collect the six digits, confirm them with the
// phone-auth provider, exchange the identity token with the backend, and
// persist the resulting session.
//
// The controller is a single-owner state machine; the driver wraps it in
// a background task for concurrent callers.

pub mod backend;
pub mod challenge;
pub mod config;
pub mod controller;
pub mod deps;
pub mod driver;
pub mod error;
pub mod otp;
pub mod phone;
pub mod session;
pub mod store;
pub mod testing;
pub mod traits;
pub mod types;

pub use config::*;
