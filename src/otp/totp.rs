//! TOTP: time-based one-time passwords (RFC 6238).
//!
//! The moving factor is `floor((time - epoch) / step)`; everything else is
//! delegated to HOTP. Verification searches both sides of the reference step,
//! nearest first, with ties going to the earlier step.

use crate::otp::codec::Secret;
use crate::otp::hotp::{hotp_code, tokens_match};
use crate::otp::truncate::{check_digits, truncate};
use crate::otp::types::*;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Options
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Inputs for [`Totp::generate`].
#[derive(Clone)]
pub struct TotpOptions {
    /// Shared secret, interpreted with `encoding`.
    pub secret: String,
    pub encoding: Encoding,
    /// Unix seconds; the current time when `None`.
    pub time: Option<u64>,
    /// Step length in seconds (default 30).
    pub step: u64,
    /// Unix seconds at which step 0 begins (default 0).
    pub epoch: u64,
    /// Explicit counter; overrides the value derived from time.
    pub counter: Option<u64>,
    pub digits: u32,
    pub algorithm: Algorithm,
    /// Precomputed HMAC digest; skips the hashing step when set.
    pub digest: Option<Vec<u8>>,
}

impl std::fmt::Debug for TotpOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TotpOptions")
            .field("secret", &"[REDACTED]")
            .field("encoding", &self.encoding)
            .field("time", &self.time)
            .field("step", &self.step)
            .field("epoch", &self.epoch)
            .field("counter", &self.counter)
            .field("digits", &self.digits)
            .field("algorithm", &self.algorithm)
            .field("digest", &self.digest.is_some())
            .finish()
    }
}

impl TotpOptions {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            encoding: Encoding::default(),
            time: None,
            step: DEFAULT_STEP,
            epoch: DEFAULT_EPOCH,
            counter: None,
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

    /// Builder: pin the clock.
    pub fn at_time(mut self, unix_seconds: u64) -> Self {
        self.time = Some(unix_seconds);
        self
    }

    /// Builder: set step length.
    pub fn with_step(mut self, step: u64) -> Self {
        self.step = step;
        self
    }

    /// Builder: set epoch.
    pub fn with_epoch(mut self, epoch: u64) -> Self {
        self.epoch = epoch;
        self
    }

    /// Builder: bypass the clock with an explicit counter.
    pub fn with_counter(mut self, counter: u64) -> Self {
        self.counter = Some(counter);
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

/// Inputs for [`Totp::verify`] and [`Totp::verify_delta`].
#[derive(Clone)]
pub struct TotpVerifyOptions {
    /// Shared secret, interpreted with `encoding`.
    pub secret: String,
    pub encoding: Encoding,
    /// Code presented by the client.
    pub token: String,
    pub time: Option<u64>,
    pub step: u64,
    pub epoch: u64,
    pub counter: Option<u64>,
    /// Steps accepted on each side of the reference step.
    pub window: u64,
    pub digits: u32,
    pub algorithm: Algorithm,
}

impl std::fmt::Debug for TotpVerifyOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TotpVerifyOptions")
            .field("secret", &"[REDACTED]")
            .field("encoding", &self.encoding)
            .field("token_len", &self.token.len())
            .field("time", &self.time)
            .field("step", &self.step)
            .field("epoch", &self.epoch)
            .field("counter", &self.counter)
            .field("window", &self.window)
            .field("digits", &self.digits)
            .field("algorithm", &self.algorithm)
            .finish()
    }
}

impl TotpVerifyOptions {
    pub fn new(secret: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            encoding: Encoding::default(),
            token: token.into(),
            time: None,
            step: DEFAULT_STEP,
            epoch: DEFAULT_EPOCH,
            counter: None,
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

    /// Builder: pin the clock.
    pub fn at_time(mut self, unix_seconds: u64) -> Self {
        self.time = Some(unix_seconds);
        self
    }

    /// Builder: set step length.
    pub fn with_step(mut self, step: u64) -> Self {
        self.step = step;
        self
    }

    /// Builder: set epoch.
    pub fn with_epoch(mut self, epoch: u64) -> Self {
        self.epoch = epoch;
        self
    }

    /// Builder: bypass the clock with an explicit counter.
    pub fn with_counter(mut self, counter: u64) -> Self {
        self.counter = Some(counter);
        self
    }

    /// Builder: set drift window.
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
//  Time-step helpers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Time-step counter for a given unix timestamp.
pub fn time_step_at(unix_seconds: u64, step: u64, epoch: u64) -> Result<u64, OtpError> {
    Ok(elapsed_since_epoch(unix_seconds, step, epoch)? / step)
}

/// Seconds until the step containing `unix_seconds` ends.
pub fn seconds_remaining_at(unix_seconds: u64, step: u64, epoch: u64) -> Result<u64, OtpError> {
    Ok(step - elapsed_since_epoch(unix_seconds, step, epoch)? % step)
}

fn elapsed_since_epoch(unix_seconds: u64, step: u64, epoch: u64) -> Result<u64, OtpError> {
    if step == 0 {
        return Err(OtpError::new(OtpErrorKind::InvalidStep, "Time step must be at least 1 second"));
    }
    unix_seconds.checked_sub(epoch).ok_or_else(|| {
        OtpError::new(
            OtpErrorKind::InvalidTime,
            format!("Time {} is earlier than epoch {}", unix_seconds, epoch),
        )
    })
}

/// Counter override if present, otherwise the step derived from the clock.
fn reference_counter(
    counter: Option<u64>,
    time: Option<u64>,
    step: u64,
    epoch: u64,
) -> Result<u64, OtpError> {
    match counter {
        Some(c) => Ok(c),
        None => time_step_at(time.unwrap_or_else(current_unix_time), step, epoch),
    }
}

/// Current unix timestamp in seconds.
fn current_unix_time() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Offsets in search order: `0, -1, +1, -2, +2, …`, skipping those below counter 0.
fn search_offsets(reference: u64, window: u64) -> impl Iterator<Item = i64> {
    let behind = reference.min(window);
    std::iter::once(0i64).chain((1..=window).flat_map(move |k| {
        let back = (k <= behind).then(|| -(k as i64));
        back.into_iter().chain(std::iter::once(k as i64))
    }))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Engine
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Time-based OTP engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct Totp;

impl Totp {
    /// Seconds left before the code for `options` rolls over.
    pub fn seconds_remaining(&self, options: &TotpOptions) -> Result<u64, OtpError> {
        seconds_remaining_at(
            options.time.unwrap_or_else(current_unix_time),
            options.step,
            options.epoch,
        )
    }
}

impl OneTimePassword for Totp {
    type Options = TotpOptions;
    type VerifyOptions = TotpVerifyOptions;

    fn generate(&self, options: &TotpOptions) -> Result<String, OtpError> {
        check_digits(options.digits)?;
        if let Some(digest) = &options.digest {
            return truncate(digest, options.digits);
        }
        let counter =
            reference_counter(options.counter, options.time, options.step, options.epoch)?;
        let key = Secret::decode(&options.secret, options.encoding)?;
        hotp_code(&key, counter, options.digits, options.algorithm)
    }

    fn verify_delta(&self, options: &TotpVerifyOptions) -> Result<Option<Delta>, OtpError> {
        check_digits(options.digits)?;
        let key = Secret::decode(&options.secret, options.encoding)?;
        key.ensure_not_empty()?;
        let reference =
            reference_counter(options.counter, options.time, options.step, options.epoch)?;

        if reference.checked_add(options.window).is_none() {
            return Err(OtpError::new(
                OtpErrorKind::CounterOverflow,
                format!(
                    "Counter {} plus window {} exceeds the 64-bit range",
                    reference, options.window
                ),
            ));
        }

        if options.token.len() != options.digits as usize {
            log::debug!(
                "totp verify: token length {} does not match {} digits",
                options.token.len(),
                options.digits
            );
            return Ok(None);
        }

        for offset in search_offsets(reference, options.window) {
            let counter = reference.wrapping_add_signed(offset);
            log::trace!("totp verify: trying step {} (offset {})", counter, offset);
            let expected = hotp_code(&key, counter, options.digits, options.algorithm)?;
            if tokens_match(&expected, &options.token) {
                log::debug!("totp verify: matched at step {} (delta {})", counter, offset);
                return Ok(Some(Delta { delta: offset }));
            }
        }

        log::debug!(
            "totp verify: no match within ±{} steps of {}",
            options.window,
            reference
        );
        Ok(None)
    }
}
