//! OTP engine: sub-modules.

pub mod types;
pub mod codec;
pub mod digest;
pub mod truncate;
pub mod hotp;
pub mod totp;
pub mod secret;
pub mod uri;
pub mod options;

// Re-export top-level items for convenience.
pub use types::*;
pub use codec::Secret;
pub use digest::{digest, hmac_digest, DigestOptions};
pub use truncate::truncate;
pub use hotp::{Hotp, HotpOptions, HotpVerifyOptions};
pub use totp::{seconds_remaining_at, time_step_at, Totp, TotpOptions, TotpVerifyOptions};
pub use secret::{generate_secret, generate_secret_ascii, GenerateSecretOptions, GeneratedSecret};
pub use uri::{otpauth_url, parse_otpauth_url, OtpauthUrlOptions};
