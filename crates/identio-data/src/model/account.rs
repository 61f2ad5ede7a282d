//! Account record for identity storage.
//!
//! ## Models
//!
//! - [`Account`] - Full account record with credential and lifecycle state
//! - [`NewAccount`] - Data for creating a new account
//! - [`UpdateAccount`] - Partial change-set for updating an account

use jiff::Timestamp;
use serde::Serialize;
use uuid::Uuid;

/// A registered identity with credentials, verification and reset state.
///
/// Secret-bearing fields (`password_hash`, tokens) are skipped during
/// serialization so the record can be logged or returned for audit without
/// leaking credentials.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Account {
    /// Unique account identifier, random and never reused.
    pub id: Uuid,
    /// Login name, unique among non-deleted accounts.
    pub username: String,
    /// Email address, unique among non-deleted accounts, stored lowercase.
    pub email: String,
    /// Argon2id PHC-encoded password hash, never the plaintext.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// When the email was verified; `None` means unverified.
    pub verified_at: Option<Timestamp>,
    /// Single-use email verification token, present until consumed.
    #[serde(skip_serializing)]
    pub verification_token: String,
    /// Single-use password-reset token, present only while a reset is
    /// pending.
    #[serde(skip_serializing)]
    pub password_reset_token: Option<String>,
    /// Expiry of the pending password reset.
    #[serde(skip_serializing)]
    pub password_reset_expires_at: Option<Timestamp>,
    /// Administrative privileges; true only for the bootstrap account.
    pub is_admin: bool,
    /// Preferred language tag, consumed by mail and transport collaborators.
    pub locale: String,
    /// Timestamp when the account was created.
    pub created_at: Timestamp,
    /// Timestamp when the account was last updated.
    pub updated_at: Timestamp,
    /// Timestamp when the account was soft-deleted.
    pub deleted_at: Option<Timestamp>,
}

/// Data for creating a new account.
///
/// The store assigns the id, lifecycle timestamps, and the bootstrap admin
/// flag; callers supply everything else pre-validated and pre-hashed.
#[derive(Debug, Clone)]
pub struct NewAccount {
    /// Login name.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Argon2id PHC-encoded password hash.
    pub password_hash: String,
    /// Fresh single-use verification token.
    pub verification_token: String,
    /// Preferred language tag.
    pub locale: String,
    /// Creation instant, read from the caller's clock.
    pub created_at: Timestamp,
}

/// Partial change-set for updating an account.
///
/// Outer `None` skips a field. For the reset-token pair the nested option
/// distinguishes setting (`Some(Some(_))`) from clearing (`Some(None)`).
#[derive(Debug, Clone, Default)]
pub struct UpdateAccount {
    /// New login name.
    pub username: Option<String>,
    /// New email address.
    pub email: Option<String>,
    /// New password hash.
    pub password_hash: Option<String>,
    /// New preferred language tag.
    pub locale: Option<String>,
    /// Marks the account verified at the given instant.
    pub verified_at: Option<Timestamp>,
    /// Sets or clears the pending password-reset token.
    pub password_reset_token: Option<Option<String>>,
    /// Sets or clears the pending password-reset expiry.
    pub password_reset_expires_at: Option<Option<Timestamp>>,
}

impl Account {
    /// Returns whether the email address has been verified.
    pub fn is_verified(&self) -> bool {
        self.verified_at.is_some()
    }

    /// Returns whether the account is soft-deleted.
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Returns whether a password reset is pending and unexpired at `now`.
    pub fn has_pending_reset(&self, now: Timestamp) -> bool {
        self.password_reset_token.is_some()
            && self
                .password_reset_expires_at
                .is_some_and(|expires_at| expires_at > now)
    }
}
