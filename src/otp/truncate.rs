//! Dynamic truncation per RFC 4226 §5.3.

use crate::otp::types::*;

/// Reduce an HMAC digest to a zero-padded decimal code of `digits` characters.
///
/// The low nibble of the last byte picks a 4-byte window; its top bit is
/// cleared and the remaining 31-bit big-endian value is taken modulo
/// `10^digits`.
pub fn truncate(digest: &[u8], digits: u32) -> Result<String, OtpError> {
    check_digits(digits)?;
    let binary = dynamic_truncate(digest)?;
    // u64 so that 10^10 does not overflow
    let modulus = 10u64.pow(digits);
    let code = u64::from(binary) % modulus;
    Ok(format!("{:0>width$}", code, width = digits as usize))
}

/// Validate a code width.
pub fn check_digits(digits: u32) -> Result<(), OtpError> {
    if !(MIN_DIGITS..=MAX_DIGITS).contains(&digits) {
        return Err(OtpError::invalid_digits(digits));
    }
    Ok(())
}

fn dynamic_truncate(digest: &[u8]) -> Result<u32, OtpError> {
    let last = *digest
        .last()
        .ok_or_else(|| OtpError::new(OtpErrorKind::InvalidDigest, "Digest is empty"))?;
    let offset = (last & 0x0f) as usize;
    if offset + 4 > digest.len() {
        return Err(OtpError::new(
            OtpErrorKind::InvalidDigest,
            format!("Digest of {} bytes is too short for offset {}", digest.len(), offset),
        ));
    }
    Ok(((digest[offset] as u32 & 0x7f) << 24)
        | ((digest[offset + 1] as u32) << 16)
        | ((digest[offset + 2] as u32) << 8)
        | (digest[offset + 3] as u32))
}
