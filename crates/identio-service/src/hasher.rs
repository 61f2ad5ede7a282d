//! Password hashing and verification using Argon2id.
//!
//! Hashes are PHC strings embedding algorithm, version, parameters, salt,
//! and derived key, so verification is self-describing and parameter
//! upgrades only affect newly hashed passwords. Verification compares the
//! derived key in constant time.

use argon2::password_hash::{Error as ArgonError, SaltString};
use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher as _, PasswordVerifier, Version,
};
use rand::rngs::OsRng;

use crate::TRACING_TARGET_HASHER as TRACING_TARGET;
use crate::error::BoxedError;

/// Memory cost in KiB (≈19 MB, OWASP recommended).
const MEMORY_COST_KIB: u32 = 19_456;
/// Iteration count (OWASP recommended).
const TIME_COST: u32 = 2;
/// Lanes (OWASP recommended).
const PARALLELISM: u32 = 1;

/// The error type for credential hashing operations.
#[derive(Debug, thiserror::Error)]
#[must_use = "hasher errors should be handled appropriately"]
pub enum HasherError {
    /// The Argon2 parameter set was rejected at construction.
    #[error("invalid password hashing parameters: {0}")]
    Params(argon2::Error),

    /// The stored value is not a parseable PHC string, or it names an
    /// algorithm or version this build does not support.
    ///
    /// Distinct from a failed verification: a malformed record is a data
    /// integrity problem, not a wrong password.
    #[error("unsupported password hash encoding: {0}")]
    MalformedHash(ArgonError),

    /// The key derivation itself failed.
    #[error("password hashing failed: {0}")]
    Hashing(ArgonError),

    /// The salt entropy source failed.
    #[error("salt generation failed")]
    Entropy(#[source] BoxedError),
}

/// Argon2id credential hasher.
///
/// Pure over its inputs aside from salt randomness: no I/O, just CPU and
/// memory, intentionally slow.
#[derive(Debug, Clone)]
pub struct CredentialHasher {
    argon2: Argon2<'static>,
}

impl CredentialHasher {
    /// Creates a hasher with the recommended parameter set.
    pub fn new() -> Result<Self, HasherError> {
        let params =
            Params::new(MEMORY_COST_KIB, TIME_COST, PARALLELISM, None).map_err(HasherError::Params)?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        Ok(Self { argon2 })
    }

    /// Hashes a password with a fresh random salt.
    ///
    /// Returns a PHC string suitable for long-term storage; repeated calls
    /// with the same password produce different strings that all verify.
    pub fn hash(&self, password: &str) -> Result<String, HasherError> {
        let salt = SaltString::try_from_rng(&mut OsRng).map_err(|err| {
            tracing::error!(
                target: TRACING_TARGET,
                error = %err,
                "failed to generate password salt"
            );
            HasherError::Entropy(Box::new(err))
        })?;

        let password_hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|err| {
                tracing::error!(
                    target: TRACING_TARGET,
                    error = %err,
                    "password hashing failed"
                );
                HasherError::Hashing(err)
            })?;

        Ok(password_hash.to_string())
    }

    /// Verifies a password against a stored PHC string.
    ///
    /// Returns `Ok(false)` for a wrong password; a malformed or unsupported
    /// stored value is an error, never a silent mismatch.
    pub fn verify(&self, password: &str, encoded_hash: &str) -> Result<bool, HasherError> {
        let parsed = PasswordHash::new(encoded_hash).map_err(|err| {
            tracing::warn!(
                target: TRACING_TARGET,
                error = %err,
                "stored password hash is not a valid PHC string"
            );
            HasherError::MalformedHash(err)
        })?;

        match self.argon2.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(ArgonError::Password) => Ok(false),
            Err(err) => Err(HasherError::Hashing(err)),
        }
    }

    /// Burns a full hash-and-verify cycle against a throwaway password.
    ///
    /// Called when a login does not resolve to an account, so that the
    /// response time matches the found-account path and account existence
    /// does not leak through timing. Always returns false.
    pub fn verify_dummy(&self, password: &str) -> bool {
        use rand::Rng;

        let dummy: String = rand::rng()
            .sample_iter(rand::distr::Alphanumeric)
            .take(24)
            .map(char::from)
            .collect();

        if let Ok(dummy_hash) = self.hash(&dummy) {
            let _ = self.verify(password, &dummy_hash);
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_round_trip() -> anyhow::Result<()> {
        let hasher = CredentialHasher::new()?;
        let hash = hasher.hash("Str0ng!Pass")?;

        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify("Str0ng!Pass", &hash)?);
        assert!(!hasher.verify("Str0ng!Pass2", &hash)?);

        Ok(())
    }

    #[test]
    fn repeated_hashes_use_fresh_salts() -> anyhow::Result<()> {
        let hasher = CredentialHasher::new()?;

        let first = hasher.hash("correct horse battery staple")?;
        let second = hasher.hash("correct horse battery staple")?;

        assert_ne!(first, second);
        assert!(hasher.verify("correct horse battery staple", &first)?);
        assert!(hasher.verify("correct horse battery staple", &second)?);

        Ok(())
    }

    #[test]
    fn malformed_encoding_is_a_distinct_error() -> anyhow::Result<()> {
        let hasher = CredentialHasher::new()?;

        let err = hasher
            .verify("whatever", "not-a-phc-string")
            .expect_err("malformed hash must not verify");
        assert!(matches!(err, HasherError::MalformedHash(_)));

        Ok(())
    }

    #[test]
    fn dummy_verification_never_succeeds() -> anyhow::Result<()> {
        let hasher = CredentialHasher::new()?;
        assert!(!hasher.verify_dummy("any password at all"));
        Ok(())
    }
}
