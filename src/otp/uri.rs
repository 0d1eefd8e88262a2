//! `otpauth://` provisioning URLs per the Google Authenticator key-URI format:
//! <https://github.com/google/google-authenticator/wiki/Key-Uri-Format>
//!
//! Format: `otpauth://totp/LABEL?secret=BASE32&issuer=ISSUER&algorithm=SHA1&digits=6&period=30`

use crate::otp::codec::Secret;
use crate::otp::truncate::check_digits;
use crate::otp::types::*;

/// Parameters of a provisioning URL.
#[derive(Clone)]
pub struct OtpauthUrlOptions {
    /// Shared secret, interpreted with `encoding`; always emitted as base32.
    pub secret: String,
    pub encoding: Encoding,
    /// Account name, e.g. the user's email address.
    pub label: String,
    pub otp_type: OtpType,
    /// Initial counter; required for HOTP.
    pub counter: Option<u64>,
    pub issuer: Option<String>,
    pub digits: u32,
    /// TOTP step in seconds.
    pub period: u64,
    pub algorithm: Algorithm,
}

impl std::fmt::Debug for OtpauthUrlOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OtpauthUrlOptions")
            .field("secret", &"[REDACTED]")
            .field("encoding", &self.encoding)
            .field("label", &self.label)
            .field("otp_type", &self.otp_type)
            .field("counter", &self.counter)
            .field("issuer", &self.issuer)
            .field("digits", &self.digits)
            .field("period", &self.period)
            .field("algorithm", &self.algorithm)
            .finish()
    }
}

impl OtpauthUrlOptions {
    pub fn new(secret: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            encoding: Encoding::default(),
            label: label.into(),
            otp_type: OtpType::Totp,
            counter: None,
            issuer: None,
            digits: DEFAULT_DIGITS,
            period: DEFAULT_STEP,
            algorithm: Algorithm::default(),
        }
    }

    /// Builder: set secret encoding.
    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Builder: set issuer.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Builder: mark as HOTP starting at `counter`.
    pub fn as_hotp(mut self, counter: u64) -> Self {
        self.otp_type = OtpType::Hotp;
        self.counter = Some(counter);
        self
    }

    /// Builder: set digit count.
    pub fn with_digits(mut self, digits: u32) -> Self {
        self.digits = digits;
        self
    }

    /// Builder: set TOTP period.
    pub fn with_period(mut self, period: u64) -> Self {
        self.period = period;
        self
    }

    /// Builder: set algorithm.
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Generate
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Render an `otpauth://` URL for authenticator-app enrollment.
pub fn otpauth_url(options: &OtpauthUrlOptions) -> Result<String, OtpError> {
    if options.secret.is_empty() {
        return Err(OtpError::missing_field("secret"));
    }
    if options.label.is_empty() {
        return Err(OtpError::missing_field("label"));
    }
    check_digits(options.digits)?;
    if options.digits != 6 && options.digits != 8 {
        log::warn!(
            "otpauth URL with {} digits; most authenticator apps only accept 6 or 8",
            options.digits
        );
    }

    let secret = Secret::decode(&options.secret, options.encoding)?;
    secret.ensure_not_empty()?;

    let mut params = vec![format!("secret={}", secret.to_base32())];

    if let Some(iss) = options.issuer.as_deref().filter(|i| !i.is_empty()) {
        params.push(format!("issuer={}", urlencoding::encode(iss)));
    }

    params.push(format!("algorithm={}", options.algorithm.uri_name()));
    params.push(format!("digits={}", options.digits));

    match options.otp_type {
        OtpType::Hotp => {
            let counter = options.counter.ok_or_else(|| {
                OtpError::new(OtpErrorKind::MissingCounter, "HOTP URL requires a counter")
            })?;
            params.push(format!("counter={}", counter));
        }
        OtpType::Totp => {
            if options.period == 0 {
                return Err(OtpError::new(
                    OtpErrorKind::InvalidStep,
                    "Period must be at least 1 second",
                ));
            }
            if options.period != DEFAULT_STEP {
                params.push(format!("period={}", options.period));
            }
        }
    }

    let rendered = format!(
        "otpauth://{}/{}?{}",
        options.otp_type,
        urlencoding::encode(&options.label),
        params.join("&")
    );

    url::Url::parse(&rendered).map_err(|e| {
        OtpError::new(OtpErrorKind::InvalidUri, format!("Rendered URL does not parse: {}", e))
    })?;

    Ok(rendered)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Parse
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Parse an `otpauth://` URL back into its parameters.
///
/// The returned secret is the URL's base32 text with `encoding` set to
/// [`Encoding::Base32`].
pub fn parse_otpauth_url(uri: &str) -> Result<OtpauthUrlOptions, OtpError> {
    let url = url::Url::parse(uri)
        .map_err(|e| OtpError::new(OtpErrorKind::InvalidUri, format!("Invalid URI: {}", e)))?;

    if url.scheme() != "otpauth" {
        return Err(OtpError::new(
            OtpErrorKind::InvalidUri,
            format!("Expected scheme 'otpauth', got '{}'", url.scheme()),
        ));
    }

    let otp_type = match url.host_str() {
        Some("totp") => OtpType::Totp,
        Some("hotp") => OtpType::Hotp,
        other => {
            return Err(OtpError::new(
                OtpErrorKind::InvalidUri,
                format!("Unknown OTP type: {:?}", other),
            ))
        }
    };

    // Path is "/LABEL" or "/ISSUER:LABEL"
    let path = url.path();
    let path = path.strip_prefix('/').unwrap_or(path);
    let path_decoded = urlencoding::decode(path)
        .map_err(|_| OtpError::new(OtpErrorKind::InvalidUri, "Label is not valid UTF-8"))?;

    let (path_issuer, label) = match path_decoded.split_once(':') {
        Some((issuer, label)) => (Some(issuer.trim().to_string()), label.trim().to_string()),
        None => (None, path_decoded.to_string()),
    };

    let mut options = OtpauthUrlOptions::new(String::new(), label);
    options.otp_type = otp_type;
    options.encoding = Encoding::Base32;
    let mut param_issuer = None;

    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "secret" => options.secret = value.to_string(),
            "issuer" => param_issuer = Some(value.to_string()),
            "algorithm" => options.algorithm = value.parse()?,
            "digits" => {
                let digits = value.parse::<u32>().map_err(|_| {
                    OtpError::new(
                        OtpErrorKind::InvalidDigitCount,
                        format!("Invalid digits '{}'", value),
                    )
                })?;
                check_digits(digits)?;
                options.digits = digits;
            }
            "period" => {
                options.period = value
                    .parse::<u64>()
                    .ok()
                    .filter(|p| *p > 0)
                    .ok_or_else(|| {
                        OtpError::new(
                            OtpErrorKind::InvalidStep,
                            format!("Invalid period '{}'", value),
                        )
                    })?;
            }
            "counter" => {
                let counter = value.parse::<u64>().map_err(|_| {
                    OtpError::new(OtpErrorKind::InvalidUri, format!("Invalid counter '{}'", value))
                })?;
                options.counter = Some(counter);
            }
            _ => {} // ignore unknown params
        }
    }

    if options.secret.is_empty() {
        return Err(OtpError::missing_field("secret"));
    }
    Secret::decode(&options.secret, Encoding::Base32)?.ensure_not_empty()?;

    if otp_type == OtpType::Hotp && options.counter.is_none() {
        return Err(OtpError::new(OtpErrorKind::MissingCounter, "HOTP URI without a counter"));
    }

    // Prefer issuer from query param, then from path prefix
    options.issuer = param_issuer.or(path_issuer);

    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const RFC4226_ASCII: &str = "12345678901234567890";
    const RFC4226_B32: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";

    // ── Generate URI ─────────────────────────────────────────────

    #[test]
    fn build_basic_totp_url() {
        let url = otpauth_url(&OtpauthUrlOptions::new(RFC4226_ASCII, "alice@example.com")).unwrap();
        assert_eq!(
            url,
            format!(
                "otpauth://totp/alice%40example.com?secret={}&algorithm=SHA1&digits=6",
                RFC4226_B32
            )
        );
    }

    #[test]
    fn build_url_with_issuer_and_period() {
        let opts = OtpauthUrlOptions::new(RFC4226_ASCII, "my user")
            .with_issuer("My Corp")
            .with_algorithm(Algorithm::Sha512)
            .with_digits(8)
            .with_period(60);
        let url = otpauth_url(&opts).unwrap();
        assert_eq!(
            url,
            format!(
                "otpauth://totp/my%20user?secret={}&issuer=My%20Corp&algorithm=SHA512&digits=8&period=60",
                RFC4226_B32
            )
        );
    }

    #[test]
    fn build_hotp_url() {
        let opts = OtpauthUrlOptions::new(RFC4226_ASCII, "user").as_hotp(99);
        let url = otpauth_url(&opts).unwrap();
        assert!(url.starts_with("otpauth://hotp/user?"));
        assert!(url.ends_with("&counter=99"));
        assert!(!url.contains("period="));
    }

    #[test]
    fn hotp_url_without_counter_fails() {
        let mut opts = OtpauthUrlOptions::new(RFC4226_ASCII, "user");
        opts.otp_type = OtpType::Hotp;
        assert_eq!(otpauth_url(&opts).unwrap_err().kind, OtpErrorKind::MissingCounter);
    }

    #[test]
    fn secret_is_always_base32() {
        let hex = OtpauthUrlOptions::new("3132333435363738393031323334353637383930", "u")
            .with_encoding(Encoding::Hex);
        let b32 = OtpauthUrlOptions::new(RFC4226_B32, "u").with_encoding(Encoding::Base32);
        let expected = format!("secret={}&", RFC4226_B32);
        assert!(otpauth_url(&hex).unwrap().contains(&expected));
        assert!(otpauth_url(&b32).unwrap().contains(&expected));
    }

    #[test]
    fn missing_fields() {
        let err = otpauth_url(&OtpauthUrlOptions::new("", "u")).unwrap_err();
        assert_eq!(err.kind, OtpErrorKind::MissingField);
        let err = otpauth_url(&OtpauthUrlOptions::new(RFC4226_ASCII, "")).unwrap_err();
        assert_eq!(err.kind, OtpErrorKind::MissingField);
    }

    #[test]
    fn invalid_digits_and_period() {
        let err =
            otpauth_url(&OtpauthUrlOptions::new(RFC4226_ASCII, "u").with_digits(0)).unwrap_err();
        assert_eq!(err.kind, OtpErrorKind::InvalidDigitCount);
        let err =
            otpauth_url(&OtpauthUrlOptions::new(RFC4226_ASCII, "u").with_period(0)).unwrap_err();
        assert_eq!(err.kind, OtpErrorKind::InvalidStep);
    }

    // ── Parse ────────────────────────────────────────────────────

    #[test]
    fn parse_basic_totp() {
        let uri = "otpauth://totp/Example:alice@example.com?secret=JBSWY3DPEHPK3PXP&issuer=Example";
        let opts = parse_otpauth_url(uri).unwrap();
        assert_eq!(opts.label, "alice@example.com");
        assert_eq!(opts.issuer.as_deref(), Some("Example"));
        assert_eq!(opts.secret, "JBSWY3DPEHPK3PXP");
        assert_eq!(opts.encoding, Encoding::Base32);
        assert_eq!(opts.algorithm, Algorithm::Sha1);
        assert_eq!(opts.digits, 6);
        assert_eq!(opts.period, 30);
        assert_eq!(opts.otp_type, OtpType::Totp);
    }

    #[test]
    fn parse_issuer_in_path_only() {
        let opts =
            parse_otpauth_url("otpauth://totp/Acme:user@ex.com?secret=JBSWY3DPEHPK3PXP").unwrap();
        assert_eq!(opts.issuer.as_deref(), Some("Acme"));
        assert_eq!(opts.label, "user@ex.com");
    }

    #[test]
    fn parse_hotp_with_counter() {
        let opts =
            parse_otpauth_url("otpauth://hotp/TestLabel?secret=JBSWY3DPEHPK3PXP&counter=42")
                .unwrap();
        assert_eq!(opts.otp_type, OtpType::Hotp);
        assert_eq!(opts.counter, Some(42));
        assert!(opts.issuer.is_none());
    }

    #[test]
    fn parse_errors() {
        let kind = |uri: &str| parse_otpauth_url(uri).unwrap_err().kind;
        assert_eq!(kind("https://example.com"), OtpErrorKind::InvalidUri);
        assert_eq!(kind("not a url at all"), OtpErrorKind::InvalidUri);
        assert_eq!(kind("otpauth://unknown/Test?secret=ABC"), OtpErrorKind::InvalidUri);
        assert_eq!(kind("otpauth://totp/Test?issuer=X"), OtpErrorKind::MissingField);
        assert_eq!(kind("otpauth://hotp/Test?secret=JBSWY3DP"), OtpErrorKind::MissingCounter);
        assert_eq!(
            kind("otpauth://totp/Test?secret=JBSWY3DP&algorithm=MD5"),
            OtpErrorKind::UnsupportedAlgorithm
        );
        assert_eq!(kind("otpauth://totp/Test?secret=!!!!"), OtpErrorKind::InvalidSecret);
    }

    // ── Roundtrip ────────────────────────────────────────────────

    #[test]
    fn build_parse_roundtrip() {
        let opts = OtpauthUrlOptions::new(RFC4226_ASCII, "user@mail.com")
            .with_issuer("Git Hub")
            .with_algorithm(Algorithm::Sha256)
            .with_digits(8)
            .with_period(60);
        let parsed = parse_otpauth_url(&otpauth_url(&opts).unwrap()).unwrap();
        assert_eq!(parsed.label, "user@mail.com");
        assert_eq!(parsed.issuer.as_deref(), Some("Git Hub"));
        assert_eq!(parsed.algorithm, Algorithm::Sha256);
        assert_eq!(parsed.digits, 8);
        assert_eq!(parsed.period, 60);
        let secret = Secret::decode(&parsed.secret, parsed.encoding).unwrap();
        assert_eq!(secret.as_bytes(), RFC4226_ASCII.as_bytes());
    }

    #[test]
    fn debug_hides_secret() {
        let opts = OtpauthUrlOptions::new(RFC4226_ASCII, "alice").with_issuer("Acme");
        let dbg = format!("{:?}", opts);
        assert!(!dbg.contains(RFC4226_ASCII));
        assert!(dbg.contains("alice"));
        assert!(dbg.contains("Acme"));
    }
}
