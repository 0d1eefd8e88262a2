//! Core types for the OTP engine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Defaults
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Code width when the caller does not choose one.
pub const DEFAULT_DIGITS: u32 = 6;
/// Smallest supported code width.
pub const MIN_DIGITS: u32 = 1;
/// Largest supported code width (a 31-bit value never exceeds 10 decimal digits).
pub const MAX_DIGITS: u32 = 10;
/// TOTP time step in seconds.
pub const DEFAULT_STEP: u64 = 30;
/// TOTP epoch (Unix seconds) from which steps are counted.
pub const DEFAULT_EPOCH: u64 = 0;
/// Verification window: exact match only.
pub const DEFAULT_WINDOW: u64 = 0;
/// Length of a generated ASCII secret.
pub const DEFAULT_SECRET_LENGTH: usize = 32;
/// Account label used for a generated secret's provisioning URL.
pub const DEFAULT_SECRET_NAME: &str = "SecretKey";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Algorithm
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Hash algorithm used for HMAC-based OTP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Algorithm {
    Sha1,
    Sha256,
    Sha512,
}

impl Default for Algorithm {
    fn default() -> Self {
        Self::Sha1
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.uri_name())
    }
}

impl FromStr for Algorithm {
    type Err = OtpError;

    /// Case-insensitive; accepts the usual `SHA-1` / `HMAC-SHA1` spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "SHA1" | "SHA-1" | "HMACSHA1" | "HMAC-SHA1" => Ok(Self::Sha1),
            "SHA256" | "SHA-256" | "HMACSHA256" | "HMAC-SHA256" => Ok(Self::Sha256),
            "SHA512" | "SHA-512" | "HMACSHA512" | "HMAC-SHA512" => Ok(Self::Sha512),
            other => Err(OtpError::new(
                OtpErrorKind::UnsupportedAlgorithm,
                format!("Unsupported algorithm '{}'", other),
            )),
        }
    }
}

impl Algorithm {
    /// Name used in the `algorithm=` parameter of `otpauth://` URIs.
    pub fn uri_name(&self) -> &'static str {
        match self {
            Self::Sha1 => "SHA1",
            Self::Sha256 => "SHA256",
            Self::Sha512 => "SHA512",
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  OTP type
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Time-based or counter-based OTP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OtpType {
    Totp,
    Hotp,
}

impl Default for OtpType {
    fn default() -> Self {
        Self::Totp
    }
}

impl fmt::Display for OtpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Totp => write!(f, "totp"),
            Self::Hotp => write!(f, "hotp"),
        }
    }
}

impl FromStr for OtpType {
    type Err = OtpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "totp" => Ok(Self::Totp),
            "hotp" => Ok(Self::Hotp),
            other => Err(OtpError::new(
                OtpErrorKind::InvalidInput,
                format!("Invalid OTP type '{}'; must be 'hotp' or 'totp'", other),
            )),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Secret encoding
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// How a caller-supplied secret string maps to key bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Encoding {
    Ascii,
    Hex,
    Base32,
    Base64,
}

impl Default for Encoding {
    fn default() -> Self {
        Self::Ascii
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ascii => write!(f, "ascii"),
            Self::Hex => write!(f, "hex"),
            Self::Base32 => write!(f, "base32"),
            Self::Base64 => write!(f, "base64"),
        }
    }
}

impl FromStr for Encoding {
    type Err = OtpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ascii" => Ok(Self::Ascii),
            "hex" => Ok(Self::Hex),
            "base32" => Ok(Self::Base32),
            "base64" => Ok(Self::Base64),
            other => Err(OtpError::new(
                OtpErrorKind::UnsupportedEncoding,
                format!("Unsupported secret encoding '{}'", other),
            )),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Verification delta
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Offset between the matched counter (or time step) and the reference one.
///
/// Only produced on a successful match, so `Some(Delta { delta: 0 })` and
/// `None` never mean the same thing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Delta {
    /// Negative values mean the token belongs to an earlier step.
    pub delta: i64,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Engine trait
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A one-time password scheme: generate a code, or check one against a window.
pub trait OneTimePassword {
    /// Options accepted by [`OneTimePassword::generate`].
    type Options;
    /// Options accepted by the verification methods.
    type VerifyOptions;

    /// Produce the code for the moving factor described by `options`.
    fn generate(&self, options: &Self::Options) -> Result<String, OtpError>;

    /// Search the window for `options.token`, returning how far from the
    /// reference point it matched.
    ///
    /// `Ok(None)` is an ordinary failed verification, not an error.
    fn verify_delta(&self, options: &Self::VerifyOptions) -> Result<Option<Delta>, OtpError>;

    /// `true` iff [`OneTimePassword::verify_delta`] finds a match.
    fn verify(&self, options: &Self::VerifyOptions) -> Result<bool, OtpError> {
        Ok(self.verify_delta(options)?.is_some())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Error type
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Error kind for this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OtpErrorKind {
    /// Empty or undecodable secret.
    InvalidSecret,
    /// `digits` outside `[1, 10]`.
    InvalidDigitCount,
    /// Secret generation asked for fewer than one character.
    InvalidLength,
    /// `counter + window` does not fit in 64 bits.
    CounterOverflow,
    /// A required option was not supplied.
    MissingField,
    /// HOTP provisioning URL without a counter.
    MissingCounter,
    UnsupportedAlgorithm,
    UnsupportedEncoding,
    /// Digest too short for dynamic truncation.
    InvalidDigest,
    /// TOTP step of zero.
    InvalidStep,
    /// Time earlier than the TOTP epoch.
    InvalidTime,
    InvalidUri,
    /// An option had the wrong shape.
    InvalidInput,
}

/// Crate-level error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpError {
    pub kind: OtpErrorKind,
    pub message: String,
}

impl fmt::Display for OtpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.kind, self.message)
    }
}

impl std::error::Error for OtpError {}

impl OtpError {
    pub fn new(kind: OtpErrorKind, msg: impl Into<String>) -> Self {
        Self {
            kind,
            message: msg.into(),
        }
    }

    pub fn missing_field(field: &str) -> Self {
        Self::new(
            OtpErrorKind::MissingField,
            format!("Missing required field '{}'", field),
        )
    }

    pub fn invalid_digits(digits: u32) -> Self {
        Self::new(
            OtpErrorKind::InvalidDigitCount,
            format!(
                "Invalid digit count {}; must be between {} and {}",
                digits, MIN_DIGITS, MAX_DIGITS
            ),
        )
    }
}
