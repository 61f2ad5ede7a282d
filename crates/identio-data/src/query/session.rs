//! Session repository trait.

use std::future::Future;

use jiff::Timestamp;
use uuid::Uuid;

use crate::model::{NewSession, RotateSession, Session};
use crate::StoreResult;

/// Repository for refresh-token session storage operations.
///
/// Lookups take an explicit `now` and exclude expired (including revoked)
/// sessions; `find_session_by_token_any` is the audit-path exception.
pub trait SessionStore: Send + Sync {
    /// Creates a new session.
    fn create_session(
        &self,
        new_session: NewSession,
    ) -> impl Future<Output = StoreResult<Session>> + Send;

    /// Finds an active session by its unique identifier.
    fn find_session_by_id(
        &self,
        session_id: Uuid,
        now: Timestamp,
    ) -> impl Future<Output = StoreResult<Option<Session>>> + Send;

    /// Finds an active session by its refresh token (exact match).
    fn find_session_by_token(
        &self,
        refresh_token: &str,
        now: Timestamp,
    ) -> impl Future<Output = StoreResult<Option<Session>>> + Send;

    /// Finds a session by refresh token regardless of expiry.
    ///
    /// Used to distinguish an expired session from an unknown token after a
    /// failed rotation; never a path to reviving one.
    fn find_session_by_token_any(
        &self,
        refresh_token: &str,
    ) -> impl Future<Output = StoreResult<Option<Session>>> + Send;

    /// Lists the active sessions of an account, most recently used first.
    fn list_sessions_for_account(
        &self,
        account_id: Uuid,
        now: Timestamp,
    ) -> impl Future<Output = StoreResult<Vec<Session>>> + Send;

    /// Atomically rotates the session holding `refresh_token`.
    ///
    /// In one read-modify-write step: if an unexpired session holds the
    /// token at `rotate.now`, its token is replaced, `client_ip` and
    /// `last_used_at` are updated, and `expires_at` slides to
    /// `rotate.expires_at`. Returns `None` when no unexpired session holds
    /// the token: either it never existed, it expired, or a concurrent
    /// rotation already consumed it. Of two racing calls presenting the
    /// same token, exactly one receives the session; the old token must
    /// never resolve again.
    fn rotate_session(
        &self,
        refresh_token: &str,
        rotate: RotateSession,
    ) -> impl Future<Output = StoreResult<Option<Session>>> + Send;

    /// Revokes a session by stamping `expires_at = now`.
    ///
    /// Idempotent: revoking an already-revoked or unknown session is not an
    /// error. Returns whether a live session was actually revoked.
    fn revoke_session(
        &self,
        session_id: Uuid,
        now: Timestamp,
    ) -> impl Future<Output = StoreResult<bool>> + Send;

    /// Revokes the session holding `refresh_token`, idempotently.
    fn revoke_session_by_token(
        &self,
        refresh_token: &str,
        now: Timestamp,
    ) -> impl Future<Output = StoreResult<bool>> + Send;

    /// Revokes every live session of an account, idempotently.
    ///
    /// Returns the number of sessions revoked.
    fn revoke_all_for_account(
        &self,
        account_id: Uuid,
        now: Timestamp,
    ) -> impl Future<Output = StoreResult<u64>> + Send;
}
