//! Opaque security token generation.
//!
//! Verification tokens, password-reset tokens, and session refresh tokens
//! are all unguessable random strings. [`TokenSource`] is the injection
//! seam; [`SystemTokens`] draws from the operating system CSPRNG.

use std::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::TryRngCore;
use rand::rngs::OsRng;

/// Raw entropy per token, before encoding. 32 bytes = 256 bits.
const TOKEN_BYTES: usize = 32;

/// The entropy source could not produce random bytes.
#[derive(Debug, thiserror::Error)]
#[error("token entropy source failed")]
pub struct TokenError {
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
}

impl TokenError {
    /// Wraps the underlying RNG failure.
    pub fn new(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self {
            source: Box::new(source),
        }
    }
}

/// Source of opaque, single-purpose security tokens.
pub trait TokenSource: fmt::Debug + Send + Sync {
    /// Returns a fresh high-entropy token.
    ///
    /// Tokens are URL-safe and carry at least 128 bits of randomness; the
    /// caller treats them as opaque strings.
    fn token(&self) -> Result<String, TokenError>;
}

/// Tokens from the operating system CSPRNG, base64url-encoded without
/// padding (43 characters for 32 bytes of entropy).
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTokens;

impl TokenSource for SystemTokens {
    fn token(&self) -> Result<String, TokenError> {
        let mut bytes = [0u8; TOKEN_BYTES];
        OsRng.try_fill_bytes(&mut bytes).map_err(TokenError::new)?;
        Ok(URL_SAFE_NO_PAD.encode(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_unique_and_url_safe() {
        let source = SystemTokens;

        let first = source.token().expect("token");
        let second = source.token().expect("token");

        assert_ne!(first, second);
        assert_eq!(first.len(), 43);
        assert!(
            first
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }
}
