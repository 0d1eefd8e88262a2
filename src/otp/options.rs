//! Building options structs from loosely-typed JSON objects.
//!
//! Unknown fields are ignored. Deprecated spellings are folded into their
//! canonical field here and nowhere else; when both are present the
//! canonical one wins.
//!
//! | deprecated     | canonical |
//! |----------------|-----------|
//! | `key`          | `secret`  |
//! | `length`       | `digits` (HOTP/TOTP only) |
//! | `initial_time` | `epoch`   |

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::otp::digest::DigestOptions;
use crate::otp::hotp::{HotpOptions, HotpVerifyOptions};
use crate::otp::secret::GenerateSecretOptions;
use crate::otp::totp::{TotpOptions, TotpVerifyOptions};
use crate::otp::types::*;
use crate::otp::uri::OtpauthUrlOptions;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Raw shapes
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Every field the HOTP / TOTP / digest options understand.
#[derive(Deserialize, Default)]
struct RawOtpOptions {
    secret: Option<String>,
    key: Option<String>,
    encoding: Option<String>,
    algorithm: Option<String>,
    counter: Option<u64>,
    // signed so that negative values reach the range checks
    digits: Option<i64>,
    length: Option<i64>,
    token: Option<String>,
    window: Option<i64>,
    time: Option<f64>,
    step: Option<u64>,
    epoch: Option<u64>,
    initial_time: Option<u64>,
}

#[derive(Deserialize, Default)]
struct RawSecretOptions {
    length: Option<i64>,
    symbols: Option<bool>,
    name: Option<String>,
    issuer: Option<String>,
    otpauth_url: Option<bool>,
    qr_codes: Option<bool>,
    google_auth_qr: Option<bool>,
}

#[derive(Deserialize, Default)]
struct RawUrlOptions {
    secret: Option<String>,
    encoding: Option<String>,
    label: Option<String>,
    #[serde(rename = "type")]
    otp_type: Option<String>,
    counter: Option<u64>,
    issuer: Option<String>,
    digits: Option<i64>,
    period: Option<u64>,
    algorithm: Option<String>,
}

fn parse_raw<T: DeserializeOwned>(value: &Value) -> Result<T, OtpError> {
    if !value.is_object() {
        return Err(OtpError::new(OtpErrorKind::InvalidInput, "Options must be a JSON object"));
    }
    // serde messages can quote the offending value, which may be a secret
    T::deserialize(value).map_err(|_| {
        OtpError::new(OtpErrorKind::InvalidInput, "Options contain a field of the wrong type")
    })
}

/// Canonical value if present, else the deprecated one (with a warning).
fn prefer<T>(canonical: Option<T>, deprecated: Option<T>, name: &str, alias: &str) -> Option<T> {
    if deprecated.is_some() {
        log::warn!("option '{}' is deprecated; use '{}'", alias, name);
    }
    canonical.or(deprecated)
}

fn require<T>(value: Option<T>, field: &str) -> Result<T, OtpError> {
    value.ok_or_else(|| OtpError::missing_field(field))
}

fn parse_field<T: std::str::FromStr<Err = OtpError> + Default>(
    value: Option<String>,
) -> Result<T, OtpError> {
    value.map(|v| v.parse()).transpose().map(Option::unwrap_or_default)
}

/// Whole seconds from a possibly fractional, caller-supplied time.
fn whole_seconds(time: Option<f64>) -> Result<Option<u64>, OtpError> {
    match time {
        Some(t) if !t.is_finite() || t < 0.0 => Err(OtpError::new(
            OtpErrorKind::InvalidTime,
            format!("Invalid time {}", t),
        )),
        Some(t) => Ok(Some(t.floor() as u64)),
        None => Ok(None),
    }
}

fn digit_count(digits: Option<i64>) -> Result<u32, OtpError> {
    let Some(digits) = digits else {
        return Ok(DEFAULT_DIGITS);
    };
    u32::try_from(digits)
        .ok()
        .filter(|d| (MIN_DIGITS..=MAX_DIGITS).contains(d))
        .ok_or_else(|| {
            OtpError::new(
                OtpErrorKind::InvalidDigitCount,
                format!(
                    "Invalid digit count {}; must be between {} and {}",
                    digits, MIN_DIGITS, MAX_DIGITS
                ),
            )
        })
}

fn window_size(window: Option<i64>) -> Result<u64, OtpError> {
    match window {
        Some(w) => u64::try_from(w).map_err(|_| {
            OtpError::new(OtpErrorKind::InvalidInput, format!("Window {} is negative", w))
        }),
        None => Ok(DEFAULT_WINDOW),
    }
}

fn secret_length(length: Option<i64>) -> Result<usize, OtpError> {
    let Some(length) = length else {
        return Ok(DEFAULT_SECRET_LENGTH);
    };
    usize::try_from(length)
        .ok()
        .filter(|l| *l >= 1)
        .ok_or_else(|| {
            OtpError::new(
                OtpErrorKind::InvalidLength,
                format!("Secret length must be at least 1, got {}", length),
            )
        })
}

impl RawOtpOptions {
    fn secret(&mut self) -> Result<String, OtpError> {
        require(prefer(self.secret.take(), self.key.take(), "secret", "key"), "secret")
    }

    fn digits(&mut self) -> Result<u32, OtpError> {
        digit_count(prefer(self.digits.take(), self.length.take(), "digits", "length"))
    }

    fn epoch(&mut self) -> u64 {
        prefer(self.epoch.take(), self.initial_time.take(), "epoch", "initial_time")
            .unwrap_or(DEFAULT_EPOCH)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Conversions
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

impl DigestOptions {
    /// Build from a JSON object; `secret` and `counter` are required.
    pub fn from_json(value: &Value) -> Result<Self, OtpError> {
        let mut raw: RawOtpOptions = parse_raw(value)?;
        Ok(Self {
            secret: raw.secret()?,
            encoding: parse_field(raw.encoding)?,
            counter: require(raw.counter, "counter")?,
            algorithm: parse_field(raw.algorithm)?,
        })
    }
}

impl HotpOptions {
    /// Build from a JSON object; `secret` and `counter` are required.
    pub fn from_json(value: &Value) -> Result<Self, OtpError> {
        let mut raw: RawOtpOptions = parse_raw(value)?;
        Ok(Self {
            secret: raw.secret()?,
            digits: raw.digits()?,
            encoding: parse_field(raw.encoding)?,
            counter: require(raw.counter, "counter")?,
            algorithm: parse_field(raw.algorithm)?,
            digest: None,
        })
    }
}

impl HotpVerifyOptions {
    /// Build from a JSON object; `secret`, `token` and `counter` are required.
    pub fn from_json(value: &Value) -> Result<Self, OtpError> {
        let mut raw: RawOtpOptions = parse_raw(value)?;
        Ok(Self {
            secret: raw.secret()?,
            digits: raw.digits()?,
            encoding: parse_field(raw.encoding)?,
            token: require(raw.token, "token")?,
            counter: require(raw.counter, "counter")?,
            window: window_size(raw.window)?,
            algorithm: parse_field(raw.algorithm)?,
        })
    }
}

impl TotpOptions {
    /// Build from a JSON object; only `secret` is required.
    pub fn from_json(value: &Value) -> Result<Self, OtpError> {
        let mut raw: RawOtpOptions = parse_raw(value)?;
        Ok(Self {
            secret: raw.secret()?,
            digits: raw.digits()?,
            epoch: raw.epoch(),
            encoding: parse_field(raw.encoding)?,
            time: whole_seconds(raw.time)?,
            step: raw.step.unwrap_or(DEFAULT_STEP),
            counter: raw.counter,
            algorithm: parse_field(raw.algorithm)?,
            digest: None,
        })
    }
}

impl TotpVerifyOptions {
    /// Build from a JSON object; `secret` and `token` are required.
    pub fn from_json(value: &Value) -> Result<Self, OtpError> {
        let mut raw: RawOtpOptions = parse_raw(value)?;
        Ok(Self {
            secret: raw.secret()?,
            digits: raw.digits()?,
            epoch: raw.epoch(),
            encoding: parse_field(raw.encoding)?,
            token: require(raw.token, "token")?,
            time: whole_seconds(raw.time)?,
            step: raw.step.unwrap_or(DEFAULT_STEP),
            counter: raw.counter,
            window: window_size(raw.window)?,
            algorithm: parse_field(raw.algorithm)?,
        })
    }
}

impl GenerateSecretOptions {
    /// Build from a JSON object; every field is optional.
    pub fn from_json(value: &Value) -> Result<Self, OtpError> {
        let raw: RawSecretOptions = parse_raw(value)?;
        if raw.qr_codes.unwrap_or(false) || raw.google_auth_qr.unwrap_or(false) {
            log::warn!("QR code URLs are not generated; render `otpauth_url` with a QR library");
        }
        let defaults = Self::default();
        Ok(Self {
            length: secret_length(raw.length)?,
            symbols: raw.symbols.unwrap_or(defaults.symbols),
            name: raw.name.unwrap_or(defaults.name),
            issuer: raw.issuer,
            otpauth_url: raw.otpauth_url.unwrap_or(defaults.otpauth_url),
        })
    }
}

impl OtpauthUrlOptions {
    /// Build from a JSON object; `secret` and `label` are required.
    pub fn from_json(value: &Value) -> Result<Self, OtpError> {
        let raw: RawUrlOptions = parse_raw(value)?;
        Ok(Self {
            secret: require(raw.secret, "secret")?,
            label: require(raw.label, "label")?,
            encoding: parse_field(raw.encoding)?,
            otp_type: parse_field(raw.otp_type)?,
            counter: raw.counter,
            issuer: raw.issuer,
            digits: digit_count(raw.digits)?,
            period: raw.period.unwrap_or(DEFAULT_STEP),
            algorithm: parse_field(raw.algorithm)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn hotp_from_json_with_defaults() {
        let opts = HotpOptions::from_json(&json!({ "secret": "abc", "counter": 3 })).unwrap();
        assert_eq!(opts.secret, "abc");
        assert_eq!(opts.counter, 3);
        assert_eq!(opts.digits, DEFAULT_DIGITS);
        assert_eq!(opts.encoding, Encoding::Ascii);
        assert_eq!(opts.algorithm, Algorithm::Sha1);
    }

    #[test]
    fn deprecated_aliases_fill_in() {
        let opts = TotpOptions::from_json(&json!({
            "key": "abc",
            "length": 8,
            "initial_time": 60,
        }))
        .unwrap();
        assert_eq!(opts.secret, "abc");
        assert_eq!(opts.digits, 8);
        assert_eq!(opts.epoch, 60);
    }

    #[test]
    fn canonical_field_wins_over_alias() {
        let opts = TotpVerifyOptions::from_json(&json!({
            "secret": "canonical",
            "key": "deprecated",
            "digits": 6,
            "length": 8,
            "epoch": 0,
            "initial_time": 99,
            "token": "123456",
        }))
        .unwrap();
        assert_eq!(opts.secret, "canonical");
        assert_eq!(opts.digits, 6);
        assert_eq!(opts.epoch, 0);
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let opts = DigestOptions::from_json(&json!({
            "secret": "abc",
            "counter": 1,
            "color": "blue",
        }))
        .unwrap();
        assert_eq!(opts.counter, 1);
    }

    #[test]
    fn missing_required_fields() {
        let kind = |v: Value| HotpVerifyOptions::from_json(&v).unwrap_err();
        let err = kind(json!({ "token": "123456", "counter": 0 }));
        assert_eq!(err.kind, OtpErrorKind::MissingField);
        assert!(err.message.contains("secret"));
        let err = kind(json!({ "secret": "abc", "counter": 0 }));
        assert!(err.message.contains("token"));
        let err = kind(json!({ "secret": "abc", "token": "123456" }));
        assert!(err.message.contains("counter"));

        let err = OtpauthUrlOptions::from_json(&json!({ "secret": "abc" })).unwrap_err();
        assert_eq!(err.kind, OtpErrorKind::MissingField);
        assert!(err.message.contains("label"));
    }

    #[test]
    fn fractional_time_is_floored() {
        let opts = TotpOptions::from_json(&json!({ "secret": "abc", "time": 59.9 })).unwrap();
        assert_eq!(opts.time, Some(59));
        let err = TotpOptions::from_json(&json!({ "secret": "abc", "time": -1.0 })).unwrap_err();
        assert_eq!(err.kind, OtpErrorKind::InvalidTime);
    }

    #[test]
    fn string_enums_are_parsed() {
        let opts = TotpVerifyOptions::from_json(&json!({
            "secret": "GEZDGNBV",
            "encoding": "base32",
            "algorithm": "sha512",
            "token": "000000",
            "window": 2,
        }))
        .unwrap();
        assert_eq!(opts.encoding, Encoding::Base32);
        assert_eq!(opts.algorithm, Algorithm::Sha512);
        assert_eq!(opts.window, 2);

        let bad_algorithm = json!({ "secret": "a", "counter": 0, "algorithm": "md5" });
        let err = HotpOptions::from_json(&bad_algorithm).unwrap_err();
        assert_eq!(err.kind, OtpErrorKind::UnsupportedAlgorithm);
        let bad_encoding = json!({ "secret": "a", "counter": 0, "encoding": "utf7" });
        let err = HotpOptions::from_json(&bad_encoding).unwrap_err();
        assert_eq!(err.kind, OtpErrorKind::UnsupportedEncoding);
    }

    #[test]
    fn wrong_types_do_not_echo_values() {
        let err =
            HotpOptions::from_json(&json!({ "secret": 123456789, "counter": 0 })).unwrap_err();
        assert_eq!(err.kind, OtpErrorKind::InvalidInput);
        assert!(!err.message.contains("123456789"));
        let err = HotpOptions::from_json(&json!("not an object")).unwrap_err();
        assert_eq!(err.kind, OtpErrorKind::InvalidInput);
    }

    #[test]
    fn secret_options_from_json() {
        let opts = GenerateSecretOptions::from_json(&json!({
            "length": 20,
            "symbols": true,
            "otpauth_url": true,
            "issuer": "Acme",
            "qr_codes": true,
        }))
        .unwrap();
        assert_eq!(opts.length, 20);
        assert!(opts.symbols);
        assert!(opts.otpauth_url);
        assert_eq!(opts.name, DEFAULT_SECRET_NAME);
        assert_eq!(opts.issuer.as_deref(), Some("Acme"));
    }

    #[test]
    fn url_options_from_json() {
        let opts = OtpauthUrlOptions::from_json(&json!({
            "secret": "abc",
            "label": "alice",
            "type": "hotp",
            "counter": 5,
            "period": 60,
        }))
        .unwrap();
        assert_eq!(opts.otp_type, OtpType::Hotp);
        assert_eq!(opts.counter, Some(5));
        assert_eq!(opts.period, 60);
    }

    #[test]
    fn negative_digits_are_a_digit_count_error() {
        let err = HotpOptions::from_json(&json!({ "secret": "a", "counter": 0, "digits": -1 }))
            .unwrap_err();
        assert_eq!(err.kind, OtpErrorKind::InvalidDigitCount);
        let err = TotpOptions::from_json(&json!({ "secret": "a", "length": -6 })).unwrap_err();
        assert_eq!(err.kind, OtpErrorKind::InvalidDigitCount);
        let url = json!({ "secret": "a", "label": "u", "digits": -8 });
        let err = OtpauthUrlOptions::from_json(&url).unwrap_err();
        assert_eq!(err.kind, OtpErrorKind::InvalidDigitCount);
    }

    #[test]
    fn digits_out_of_range_are_rejected_at_parse_time() {
        let verify = json!({ "secret": "a", "token": "1", "digits": 11 });
        let err = TotpVerifyOptions::from_json(&verify).unwrap_err();
        assert_eq!(err.kind, OtpErrorKind::InvalidDigitCount);
        let err = HotpOptions::from_json(&json!({ "secret": "a", "counter": 0, "digits": 0 }))
            .unwrap_err();
        assert_eq!(err.kind, OtpErrorKind::InvalidDigitCount);
    }

    #[test]
    fn non_positive_secret_length_is_a_length_error() {
        for length in [-4, 0] {
            let err = GenerateSecretOptions::from_json(&json!({ "length": length })).unwrap_err();
            assert_eq!(err.kind, OtpErrorKind::InvalidLength);
        }
    }

    #[test]
    fn negative_window_is_rejected() {
        let err = HotpVerifyOptions::from_json(&json!({
            "secret": "a",
            "token": "123456",
            "counter": 0,
            "window": -2,
        }))
        .unwrap_err();
        assert_eq!(err.kind, OtpErrorKind::InvalidInput);
    }
}
