//! # otp-engine – HOTP / TOTP One-Time Passwords
//!
//! Counter-based and time-based one-time password engine:
//!
//! - **RFC 4226 / 6238** – HOTP & TOTP generation with SHA-1, SHA-256, SHA-512
//! - **Windowed verification** – look-ahead (HOTP) and two-sided (TOTP) drift search
//!   returning the matched `Delta`
//! - **Secrets** – CSPRNG secret generation, ASCII / hex / base32 / base64 codecs
//! - **otpauth:// URIs** – Provisioning URLs per the Google Authenticator key-URI format
//!
//! Every operation is a pure function of its options; counters and secrets
//! are persisted by the caller.

pub mod otp;

pub use otp::*;
