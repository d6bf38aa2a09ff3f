//! One-time temporary credential generation.
//!
//! A temporary password is set on the auth identity at creation so the
//! account is never passwordless, but it is never shown to anyone: the
//! user signs in through the emailed magic link or a password reset.
//! The value must never appear in logs, responses or the database.

use std::fmt;

use rand::rngs::OsRng;
use rand::Rng;

/// Full alphanumeric + symbol alphabet. 88 symbols at 40 chars gives
/// ~258 bits of entropy.
const ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%^&*()-_=+[]{}<>?~.,:;";

const PASSWORD_LEN: usize = 40;

/// A write-once temporary credential.
///
/// Deliberately opaque: no `Serialize`, no `Display`, and a redacted
/// `Debug` so it cannot leak through logging macros.
pub struct TempPassword(String);

impl TempPassword {
    /// Generate a fresh credential from the OS CSPRNG.
    pub fn generate() -> Self {
        let mut rng = OsRng;
        let value: String = (0..PASSWORD_LEN)
            .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
            .collect();
        Self(value)
    }

    /// Expose the secret for the single auth-provider call that needs it.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for TempPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TempPassword(REDACTED)")
    }
}
