//! One-way hashing for login passwords and reset tokens.
//!
//! Argon2id with a per-hash random salt; verification is constant-time via
//! the PHC string parser. Reset tokens go through the same pair of functions
//! so the stored form is never reversible.

use anyhow::{anyhow, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Hash a plaintext secret into a PHC-format string.
///
/// # Errors
/// Returns an error if hashing fails (never for valid UTF-8 input of sane length).
pub fn hash_secret(plain: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| anyhow!("failed to hash secret: {err}"))
}

/// Verify a plaintext secret against a stored PHC string.
///
/// An unparsable stored hash counts as a mismatch rather than an error, so a
/// corrupt row rejects the login instead of surfacing a 500.
#[must_use]
pub fn verify_secret(plain: &str, stored: &str) -> bool {
    PasswordHash::new(stored).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok()
    })
}
