//! Secret key material and its textual encodings.
//!
//! A [`Secret`] is one byte sequence; ASCII, hex, base32 and base64 are
//! lossless views of it. Decoding errors never echo the input text.

use std::fmt;

use base64::Engine as _;
use zeroize::Zeroize;

use crate::otp::types::*;

/// Shared HMAC key with zeroize-on-drop and a redacted `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret {
    bytes: Vec<u8>,
}

impl Secret {
    /// Wrap raw key bytes.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    /// Decode `text` according to `encoding`.
    pub fn decode(text: &str, encoding: Encoding) -> Result<Self, OtpError> {
        let bytes = match encoding {
            Encoding::Ascii => text.as_bytes().to_vec(),
            Encoding::Hex => hex::decode(text.trim())
                .map_err(|_| invalid_secret(encoding))?,
            Encoding::Base32 => decode_base32(text).ok_or_else(|| invalid_secret(encoding))?,
            Encoding::Base64 => base64::engine::general_purpose::STANDARD
                .decode(text.trim())
                .map_err(|_| invalid_secret(encoding))?,
        };
        Ok(Self { bytes })
    }

    /// Access the raw key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// ASCII view; fails if any byte is outside 7-bit ASCII.
    pub fn to_ascii(&self) -> Result<String, OtpError> {
        if !self.bytes.is_ascii() {
            return Err(OtpError::new(
                OtpErrorKind::InvalidSecret,
                "Secret is not representable as ASCII",
            ));
        }
        Ok(self.bytes.iter().map(|&b| b as char).collect())
    }

    /// Lower-case hex view.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    /// RFC 4648 base32 view, upper-case, no padding.
    pub fn to_base32(&self) -> String {
        base32::encode(base32::Alphabet::Rfc4648 { padding: false }, &self.bytes)
    }

    /// Standard base64 view, padded.
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.bytes)
    }

    /// Render in the given encoding.
    pub fn encode(&self, encoding: Encoding) -> Result<String, OtpError> {
        match encoding {
            Encoding::Ascii => self.to_ascii(),
            Encoding::Hex => Ok(self.to_hex()),
            Encoding::Base32 => Ok(self.to_base32()),
            Encoding::Base64 => Ok(self.to_base64()),
        }
    }

    /// Fail with `InvalidSecret` if there are no key bytes.
    pub fn ensure_not_empty(&self) -> Result<(), OtpError> {
        if self.bytes.is_empty() {
            return Err(OtpError::new(OtpErrorKind::InvalidSecret, "Secret is empty"));
        }
        Ok(())
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret([REDACTED; {} bytes])", self.bytes.len())
    }
}

impl Drop for Secret {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

fn invalid_secret(encoding: Encoding) -> OtpError {
    OtpError::new(
        OtpErrorKind::InvalidSecret,
        format!("Secret is not valid {}", encoding),
    )
}

/// Decode base-32 with or without padding, ignoring case, spaces and dashes.
fn decode_base32(text: &str) -> Option<Vec<u8>> {
    let cleaned: String = text
        .chars()
        .filter(|c| *c != ' ' && *c != '-')
        .collect::<String>()
        .to_uppercase();
    let unpadded = cleaned.trim_end_matches('=');
    if !unpadded
        .chars()
        .all(|c| matches!(c, 'A'..='Z' | '2'..='7'))
    {
        return None;
    }
    base32::decode(base32::Alphabet::Rfc4648 { padding: false }, unpadded)
}
