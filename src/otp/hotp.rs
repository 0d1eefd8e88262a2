//! HOTP: counter-based one-time passwords (RFC 4226).
//!
//! Verification looks ahead only: for counter `C` and window `W` the codes
//! for `C..=C+W` are tried in ascending order and the first match wins.
//! The caller must store `C + delta + 1` after a successful match to stop
//! replays.

use subtle::ConstantTimeEq;

use crate::otp::codec::Secret;
use crate::otp::digest::hmac_digest;
use crate::otp::truncate::{check_digits, truncate};
use crate::otp::types::*;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Options
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Inputs for [`Hotp::generate`].
#[derive(Clone)]
pub struct HotpOptions {
    /// Shared secret, interpreted with `encoding`.
    pub secret: String,
    pub encoding: Encoding,
    pub counter: u64,
    /// Code width, 1 to 10 (default 6).
    pub digits: u32,
    pub algorithm: Algorithm,
    /// Precomputed HMAC digest; skips the hashing step when set.
    pub digest: Option<Vec<u8>>,
}

impl std::fmt::Debug for HotpOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HotpOptions")
            .field("secret", &"[REDACTED]")
            .field("encoding", &self.encoding)
            .field("counter", &self.counter)
            .field("digits", &self.digits)
            .field("algorithm", &self.algorithm)
            .field("digest", &self.digest.is_some())
            .finish()
    }
}

impl HotpOptions {
    pub fn new(secret: impl Into<String>, counter: u64) -> Self {
        Self {
            secret: secret.into(),
            encoding: Encoding::default(),
            counter,
            digits: DEFAULT_DIGITS,
            algorithm: Algorithm::default(),
            digest: None,
        }
    }

    /// Builder: set secret encoding.
    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Builder: set digit count.
    pub fn with_digits(mut self, digits: u32) -> Self {
        self.digits = digits;
        self
    }

    /// Builder: set algorithm.
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Builder: supply a precomputed digest.
    pub fn with_digest(mut self, digest: Vec<u8>) -> Self {
        self.digest = Some(digest);
        self
    }
}

/// Inputs for [`Hotp::verify`] and [`Hotp::verify_delta`].
#[derive(Clone)]
pub struct HotpVerifyOptions {
    /// Shared secret, interpreted with `encoding`.
    pub secret: String,
    pub encoding: Encoding,
    /// Code presented by the client.
    pub token: String,
    /// The counter the server expects next.
    pub counter: u64,
    /// How many counters past `counter` to also accept.
    pub window: u64,
    pub digits: u32,
    pub algorithm: Algorithm,
}

impl std::fmt::Debug for HotpVerifyOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HotpVerifyOptions")
            .field("secret", &"[REDACTED]")
            .field("encoding", &self.encoding)
            .field("token_len", &self.token.len())
            .field("counter", &self.counter)
            .field("window", &self.window)
            .field("digits", &self.digits)
            .field("algorithm", &self.algorithm)
            .finish()
    }
}

impl HotpVerifyOptions {
    pub fn new(secret: impl Into<String>, token: impl Into<String>, counter: u64) -> Self {
        Self {
            secret: secret.into(),
            encoding: Encoding::default(),
            token: token.into(),
            counter,
            window: DEFAULT_WINDOW,
            digits: DEFAULT_DIGITS,
            algorithm: Algorithm::default(),
        }
    }

    /// Builder: set secret encoding.
    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Builder: set look-ahead window.
    pub fn with_window(mut self, window: u64) -> Self {
        self.window = window;
        self
    }

    /// Builder: set digit count.
    pub fn with_digits(mut self, digits: u32) -> Self {
        self.digits = digits;
        self
    }

    /// Builder: set algorithm.
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Engine
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Counter-based OTP engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct Hotp;

impl OneTimePassword for Hotp {
    type Options = HotpOptions;
    type VerifyOptions = HotpVerifyOptions;

    fn generate(&self, options: &HotpOptions) -> Result<String, OtpError> {
        check_digits(options.digits)?;
        if let Some(digest) = &options.digest {
            return truncate(digest, options.digits);
        }
        let key = Secret::decode(&options.secret, options.encoding)?;
        hotp_code(&key, options.counter, options.digits, options.algorithm)
    }

    fn verify_delta(&self, options: &HotpVerifyOptions) -> Result<Option<Delta>, OtpError> {
        check_digits(options.digits)?;
        let key = Secret::decode(&options.secret, options.encoding)?;
        key.ensure_not_empty()?;

        let end = options.counter.checked_add(options.window).ok_or_else(|| {
            OtpError::new(
                OtpErrorKind::CounterOverflow,
                format!(
                    "Counter {} plus window {} exceeds the 64-bit range",
                    options.counter, options.window
                ),
            )
        })?;

        if options.token.len() != options.digits as usize {
            log::debug!(
                "hotp verify: token length {} does not match {} digits",
                options.token.len(),
                options.digits
            );
            return Ok(None);
        }

        for counter in options.counter..=end {
            let expected = hotp_code(&key, counter, options.digits, options.algorithm)?;
            if tokens_match(&expected, &options.token) {
                let delta = (counter - options.counter) as i64;
                log::debug!("hotp verify: matched at counter {} (delta {})", counter, delta);
                return Ok(Some(Delta { delta }));
            }
        }

        log::debug!(
            "hotp verify: no match in counters {}..={}",
            options.counter,
            end
        );
        Ok(None)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Shared helpers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Code for one counter value with an already-decoded key.
pub(crate) fn hotp_code(
    key: &Secret,
    counter: u64,
    digits: u32,
    algorithm: Algorithm,
) -> Result<String, OtpError> {
    let digest = hmac_digest(key.as_bytes(), counter, algorithm)?;
    truncate(&digest, digits)
}

/// Constant-time string equality; length mismatch is a plain `false`.
pub(crate) fn tokens_match(expected: &str, token: &str) -> bool {
    let (a, b) = (expected.as_bytes(), token.as_bytes());
    a.len() == b.len() && bool::from(a.ct_eq(b))
}
