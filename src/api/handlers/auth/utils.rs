//! Small helpers for reset-token generation and input normalization.

use anyhow::{Context, Result};
use rand::{rngs::OsRng, RngCore};

/// Create a new password-reset token for email links.
///
/// 256 bits of entropy, hex-encoded. The returned plaintext is only embedded
/// in the emailed link; the database stores an argon2 hash of it.
pub(super) fn generate_reset_token() -> Result<String> {
    let mut bytes = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate reset token")?;
    Ok(hex::encode(bytes))
}

/// Normalize a token as it arrives from a reset link: path decoding is the
/// router's job, trimming is ours.
pub(super) fn normalize_token(token: &str) -> &str {
    token.trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_reset_token_is_64_hex_chars() -> Result<()> {
        let token = generate_reset_token()?;
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        Ok(())
    }

    #[test]
    fn generate_reset_token_is_random() -> Result<()> {
        assert_ne!(generate_reset_token()?, generate_reset_token()?);
        Ok(())
    }

    #[test]
    fn normalize_token_trims_whitespace() {
        assert_eq!(normalize_token("  abc123 \n"), "abc123");
        assert_eq!(normalize_token(""), "");
    }
}
