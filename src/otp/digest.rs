//! HMAC digest over the moving factor (RFC 4226 §5.2).

use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::{Sha256, Sha512};

use crate::otp::codec::Secret;
use crate::otp::types::*;

/// Inputs for [`digest`].
#[derive(Clone)]
pub struct DigestOptions {
    /// Shared secret, interpreted with `encoding`.
    pub secret: String,
    pub encoding: Encoding,
    pub counter: u64,
    pub algorithm: Algorithm,
}

impl std::fmt::Debug for DigestOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DigestOptions")
            .field("secret", &"[REDACTED]")
            .field("encoding", &self.encoding)
            .field("counter", &self.counter)
            .field("algorithm", &self.algorithm)
            .finish()
    }
}

impl DigestOptions {
    pub fn new(secret: impl Into<String>, counter: u64) -> Self {
        Self {
            secret: secret.into(),
            encoding: Encoding::default(),
            counter,
            algorithm: Algorithm::default(),
        }
    }

    /// Builder: set secret encoding.
    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Builder: set algorithm.
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }
}

/// Decode the secret in `options` and digest its counter.
pub fn digest(options: &DigestOptions) -> Result<Vec<u8>, OtpError> {
    let key = Secret::decode(&options.secret, options.encoding)?;
    hmac_digest(key.as_bytes(), options.counter, options.algorithm)
}

/// HMAC of the 8-byte big-endian `counter`, keyed with `key`.
pub fn hmac_digest(key: &[u8], counter: u64, algorithm: Algorithm) -> Result<Vec<u8>, OtpError> {
    if key.is_empty() {
        return Err(OtpError::new(OtpErrorKind::InvalidSecret, "Secret is empty"));
    }
    compute_hmac(key, &counter.to_be_bytes(), algorithm)
}

/// Compute HMAC(key, message) using the specified algorithm.
fn compute_hmac(key: &[u8], data: &[u8], algorithm: Algorithm) -> Result<Vec<u8>, OtpError> {
    match algorithm {
        Algorithm::Sha1 => {
            let mut mac = Hmac::<Sha1>::new_from_slice(key).map_err(key_rejected)?;
            mac.update(data);
            Ok(mac.finalize().into_bytes().to_vec())
        }
        Algorithm::Sha256 => {
            let mut mac = Hmac::<Sha256>::new_from_slice(key).map_err(key_rejected)?;
            mac.update(data);
            Ok(mac.finalize().into_bytes().to_vec())
        }
        Algorithm::Sha512 => {
            let mut mac = Hmac::<Sha512>::new_from_slice(key).map_err(key_rejected)?;
            mac.update(data);
            Ok(mac.finalize().into_bytes().to_vec())
        }
    }
}

// HMAC takes keys of any length, so this only fires on a broken backend.
fn key_rejected(_: hmac::digest::InvalidLength) -> OtpError {
    OtpError::new(OtpErrorKind::InvalidSecret, "HMAC rejected the key")
}
