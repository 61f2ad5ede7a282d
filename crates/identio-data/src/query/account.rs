//! Account repository trait.

use std::future::Future;

use jiff::Timestamp;
use uuid::Uuid;

use crate::model::{Account, NewAccount, UpdateAccount};
use crate::StoreResult;

/// Repository for account storage operations.
///
/// Every lookup excludes soft-deleted accounts; the explicit `…_any`
/// variants include them for audit and conflict-classification paths.
/// Implementations must serialize mutations on a single account row
/// (row-level locking, a transaction, or an equivalent compare-and-swap) so
/// that concurrent creations and updates observe a consistent uniqueness
/// check.
pub trait AccountStore: Send + Sync {
    /// Creates a new account.
    ///
    /// Uniqueness of username and email among non-deleted accounts is
    /// checked atomically with the insert; a collision reports whether the
    /// existing account is live or deactivated. The first account ever
    /// inserted is flagged admin as part of the same atomic step; SQL
    /// backends typically enforce this with an insert-if-count-zero
    /// transaction or a unique partial index on the admin flag, so that two
    /// racing first registrations elect exactly one admin.
    ///
    /// The username is trimmed and the email is trimmed and lowercased
    /// before the insert.
    fn create_account(
        &self,
        new_account: NewAccount,
    ) -> impl Future<Output = StoreResult<Account>> + Send;

    /// Finds an account by its unique identifier.
    fn find_account_by_id(
        &self,
        account_id: Uuid,
    ) -> impl Future<Output = StoreResult<Option<Account>>> + Send;

    /// Finds an account by email address (case-insensitive).
    fn find_account_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = StoreResult<Option<Account>>> + Send;

    /// Finds an account by username (exact match).
    fn find_account_by_username(
        &self,
        username: &str,
    ) -> impl Future<Output = StoreResult<Option<Account>>> + Send;

    /// Finds an account by its email verification token (exact match).
    fn find_account_by_verification_token(
        &self,
        token: &str,
    ) -> impl Future<Output = StoreResult<Option<Account>>> + Send;

    /// Finds an account by its password-reset token (exact match).
    ///
    /// Expiry of the reset window is the caller's decision; this lookup
    /// only requires the token to be present on a non-deleted account.
    fn find_account_by_password_reset_token(
        &self,
        token: &str,
    ) -> impl Future<Output = StoreResult<Option<Account>>> + Send;

    /// Finds an account by email, including soft-deleted accounts.
    fn find_account_by_email_any(
        &self,
        email: &str,
    ) -> impl Future<Output = StoreResult<Option<Account>>> + Send;

    /// Finds an account by username, including soft-deleted accounts.
    fn find_account_by_username_any(
        &self,
        username: &str,
    ) -> impl Future<Output = StoreResult<Option<Account>>> + Send;

    /// Finds the earliest-created account, including soft-deleted accounts.
    ///
    /// Audit helper; the bootstrap-admin decision itself happens inside
    /// [`create_account`](AccountStore::create_account).
    fn find_first_account(&self) -> impl Future<Output = StoreResult<Option<Account>>> + Send;

    /// Applies a partial update to an account.
    ///
    /// Username and email changes re-run the same atomic uniqueness checks
    /// as creation. `updated_at` is bumped to `now`. Returns `None` if the
    /// account does not exist or is soft-deleted.
    fn update_account(
        &self,
        account_id: Uuid,
        updates: UpdateAccount,
        now: Timestamp,
    ) -> impl Future<Output = StoreResult<Option<Account>>> + Send;

    /// Soft-deletes an account by stamping `deleted_at`.
    ///
    /// The record is preserved for audit; all regular lookups treat it as
    /// absent from then on. Returns `None` if the account does not exist or
    /// was already deleted.
    fn delete_account(
        &self,
        account_id: Uuid,
        now: Timestamp,
    ) -> impl Future<Output = StoreResult<Option<Account>>> + Send;
}
