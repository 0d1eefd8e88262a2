//! Random secret generation.
//!
//! Secrets are printable ASCII drawn from the OS CSPRNG, returned in ASCII,
//! hex and base32 form (plus an optional `otpauth://` URL).

use rand::rngs::OsRng;
use rand::{CryptoRng, Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::otp::codec::Secret;
use crate::otp::types::*;
use crate::otp::uri::{otpauth_url, OtpauthUrlOptions};

const ALPHANUMERIC: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
const SYMBOLS: &[u8] = b"!@#$%^&*()<>?/[]{},.:;";

/// Inputs for [`generate_secret`].
#[derive(Debug, Clone)]
pub struct GenerateSecretOptions {
    /// Number of ASCII characters (default 32).
    pub length: usize,
    /// Mix punctuation into the alphabet.
    pub symbols: bool,
    /// Account label for the provisioning URL.
    pub name: String,
    pub issuer: Option<String>,
    /// Also render an `otpauth://` URL.
    pub otpauth_url: bool,
}

impl Default for GenerateSecretOptions {
    fn default() -> Self {
        Self {
            length: DEFAULT_SECRET_LENGTH,
            symbols: false,
            name: DEFAULT_SECRET_NAME.to_string(),
            issuer: None,
            otpauth_url: false,
        }
    }
}

impl GenerateSecretOptions {
    /// Builder: set length.
    pub fn with_length(mut self, length: usize) -> Self {
        self.length = length;
        self
    }

    /// Builder: include symbols.
    pub fn with_symbols(mut self, symbols: bool) -> Self {
        self.symbols = symbols;
        self
    }

    /// Builder: request a provisioning URL for `name`.
    pub fn with_otpauth_url(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self.otpauth_url = true;
        self
    }

    /// Builder: set issuer.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }
}

/// A freshly generated secret in every encoding.
#[derive(Clone, Serialize, Deserialize)]
pub struct GeneratedSecret {
    pub ascii: String,
    pub hex: String,
    /// Unpadded RFC 4648 base32.
    pub base32: String,
    pub otpauth_url: Option<String>,
}

impl GeneratedSecret {
    /// The secret as key bytes.
    pub fn secret(&self) -> Secret {
        Secret::from_bytes(self.ascii.as_bytes())
    }
}

impl std::fmt::Debug for GeneratedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratedSecret")
            .field("len", &self.ascii.len())
            .field("otpauth_url", &self.otpauth_url.is_some())
            .finish()
    }
}

/// Generate a secret from the OS CSPRNG.
pub fn generate_secret(options: &GenerateSecretOptions) -> Result<GeneratedSecret, OtpError> {
    generate_secret_with(&mut OsRng, options)
}

/// Generate a secret from a caller-chosen cryptographic RNG.
pub fn generate_secret_with<R: RngCore + CryptoRng>(
    rng: &mut R,
    options: &GenerateSecretOptions,
) -> Result<GeneratedSecret, OtpError> {
    let ascii = generate_secret_ascii_with(rng, options.length, options.symbols)?;
    let secret = Secret::from_bytes(ascii.as_bytes());

    let otpauth_url = if options.otpauth_url {
        let mut url_opts = OtpauthUrlOptions::new(ascii.clone(), options.name.clone());
        url_opts.issuer = options.issuer.clone();
        Some(otpauth_url(&url_opts)?)
    } else {
        None
    };

    log::debug!(
        "generated {}-character secret (symbols: {})",
        options.length,
        options.symbols
    );

    Ok(GeneratedSecret {
        hex: secret.to_hex(),
        base32: secret.to_base32(),
        ascii,
        otpauth_url,
    })
}

/// Random printable secret of `length` characters.
pub fn generate_secret_ascii(length: usize, symbols: bool) -> Result<String, OtpError> {
    generate_secret_ascii_with(&mut OsRng, length, symbols)
}

/// [`generate_secret_ascii`] with a caller-chosen cryptographic RNG.
pub fn generate_secret_ascii_with<R: RngCore + CryptoRng>(
    rng: &mut R,
    length: usize,
    symbols: bool,
) -> Result<String, OtpError> {
    if length < 1 {
        return Err(OtpError::new(
            OtpErrorKind::InvalidLength,
            "Secret length must be at least 1",
        ));
    }
    let alphabet: Vec<u8> = if symbols {
        [ALPHANUMERIC, SYMBOLS].concat()
    } else {
        ALPHANUMERIC.to_vec()
    };
    Ok((0..length)
        .map(|_| alphabet[rng.gen_range(0..alphabet.len())] as char)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::otp::types::Encoding;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn default_secret_is_32_alphanumerics() {
        let s = generate_secret(&GenerateSecretOptions::default()).unwrap();
        assert_eq!(s.ascii.len(), 32);
        assert!(s.ascii.bytes().all(|b| ALPHANUMERIC.contains(&b)));
        assert!(s.otpauth_url.is_none());
    }

    #[test]
    fn encodings_are_views_of_one_secret() {
        let s = generate_secret(&GenerateSecretOptions::default().with_symbols(true)).unwrap();
        let from_b32 = Secret::decode(&s.base32, Encoding::Base32).unwrap();
        let from_hex = Secret::decode(&s.hex, Encoding::Hex).unwrap();
        let from_ascii = Secret::decode(&s.ascii, Encoding::Ascii).unwrap();
        assert_eq!(from_b32, from_hex);
        assert_eq!(from_hex, from_ascii);
        assert_eq!(from_ascii, s.secret());
        assert!(!s.base32.contains('='));
    }

    #[test]
    fn symbols_stay_within_alphabet() {
        let mut rng = StdRng::seed_from_u64(7);
        let s = generate_secret_ascii_with(&mut rng, 500, true).unwrap();
        assert!(s.bytes().all(|b| ALPHANUMERIC.contains(&b) || SYMBOLS.contains(&b)));
        assert!(s.bytes().any(|b| SYMBOLS.contains(&b)));
    }

    #[test]
    fn seeded_rng_is_reproducible() {
        let a = generate_secret_ascii_with(&mut StdRng::seed_from_u64(1), 20, false).unwrap();
        let b = generate_secret_ascii_with(&mut StdRng::seed_from_u64(1), 20, false).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn zero_length_rejected() {
        let err = generate_secret_ascii(0, false).unwrap_err();
        assert_eq!(err.kind, OtpErrorKind::InvalidLength);
        let err = generate_secret(&GenerateSecretOptions::default().with_length(0)).unwrap_err();
        assert_eq!(err.kind, OtpErrorKind::InvalidLength);
    }

    #[test]
    fn otpauth_url_on_request() {
        let s = generate_secret(
            &GenerateSecretOptions::default()
                .with_otpauth_url("alice@example.com")
                .with_issuer("Acme Co"),
        )
        .unwrap();
        let url = s.otpauth_url.as_deref().unwrap();
        assert!(url.starts_with("otpauth://totp/alice%40example.com?"));
        assert!(url.contains(&format!("secret={}", s.base32)));
        assert!(url.contains("issuer=Acme%20Co"));
    }

    #[test]
    fn debug_hides_secret() {
        let s = generate_secret(&GenerateSecretOptions::default()).unwrap();
        let dbg = format!("{:?}", s);
        assert!(!dbg.contains(&s.ascii));
        assert!(!dbg.contains(&s.base32));
    }
}
