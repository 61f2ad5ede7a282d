//! In-memory storage implementation.
//!
//! Reference backend for tests and embedders. A single mutex over the
//! record maps gives every mutation the per-row atomicity the repository
//! contracts require; the lock is never held across an await point.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use jiff::Timestamp;
use uuid::Uuid;

use crate::model::{Account, NewAccount, NewSession, RotateSession, Session, UpdateAccount};
use crate::query::{AccountStore, SessionStore};
use crate::{StoreError, StoreResult, TRACING_TARGET_STORE, UniqueField};

/// In-memory account and session store.
///
/// Clones share the same underlying maps, so one store can be handed to a
/// service while a test keeps its own handle.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    accounts: HashMap<Uuid, Account>,
    sessions: HashMap<Uuid, Session>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().expect("store mutex poisoned")
    }
}

impl Inner {
    /// Classifies a collision on a unique field, ignoring `exclude`.
    ///
    /// A live collision wins over a deactivated one so the caller always
    /// sees the strongest conflict.
    fn unique_conflict(
        &self,
        field: UniqueField,
        value: &str,
        exclude: Option<Uuid>,
    ) -> Option<StoreError> {
        let mut deactivated = false;
        for account in self.accounts.values() {
            if exclude == Some(account.id) {
                continue;
            }
            let collides = match field {
                UniqueField::Username => account.username == value,
                UniqueField::Email => account.email == value,
            };
            if !collides {
                continue;
            }
            if account.is_deleted() {
                deactivated = true;
            } else {
                return Some(StoreError::Conflict {
                    field,
                    deactivated: false,
                });
            }
        }

        deactivated.then_some(StoreError::Conflict {
            field,
            deactivated: true,
        })
    }
}

impl AccountStore for MemoryStore {
    async fn create_account(&self, new_account: NewAccount) -> StoreResult<Account> {
        let username = new_account.username.trim().to_owned();
        let email = new_account.email.trim().to_lowercase();

        let mut inner = self.lock();

        if let Some(conflict) = inner.unique_conflict(UniqueField::Email, &email, None) {
            return Err(conflict);
        }
        if let Some(conflict) = inner.unique_conflict(UniqueField::Username, &username, None) {
            return Err(conflict);
        }

        // First row ever inserted becomes the bootstrap admin; the
        // election and the insert share one lock acquisition.
        let is_admin = inner.accounts.is_empty();

        let account = Account {
            id: Uuid::new_v4(),
            username,
            email,
            password_hash: new_account.password_hash,
            verified_at: None,
            verification_token: new_account.verification_token,
            password_reset_token: None,
            password_reset_expires_at: None,
            is_admin,
            locale: new_account.locale,
            created_at: new_account.created_at,
            updated_at: new_account.created_at,
            deleted_at: None,
        };
        inner.accounts.insert(account.id, account.clone());

        tracing::debug!(
            target: TRACING_TARGET_STORE,
            account_id = %account.id,
            is_admin = account.is_admin,
            "account created"
        );

        Ok(account)
    }

    async fn find_account_by_id(&self, account_id: Uuid) -> StoreResult<Option<Account>> {
        let inner = self.lock();
        Ok(inner
            .accounts
            .get(&account_id)
            .filter(|account| !account.is_deleted())
            .cloned())
    }

    async fn find_account_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        let email = email.trim().to_lowercase();
        let inner = self.lock();
        Ok(inner
            .accounts
            .values()
            .find(|account| account.email == email && !account.is_deleted())
            .cloned())
    }

    async fn find_account_by_username(&self, username: &str) -> StoreResult<Option<Account>> {
        let inner = self.lock();
        Ok(inner
            .accounts
            .values()
            .find(|account| account.username == username && !account.is_deleted())
            .cloned())
    }

    async fn find_account_by_verification_token(
        &self,
        token: &str,
    ) -> StoreResult<Option<Account>> {
        let inner = self.lock();
        Ok(inner
            .accounts
            .values()
            .find(|account| account.verification_token == token && !account.is_deleted())
            .cloned())
    }

    async fn find_account_by_password_reset_token(
        &self,
        token: &str,
    ) -> StoreResult<Option<Account>> {
        let inner = self.lock();
        Ok(inner
            .accounts
            .values()
            .find(|account| {
                account.password_reset_token.as_deref() == Some(token) && !account.is_deleted()
            })
            .cloned())
    }

    async fn find_account_by_email_any(&self, email: &str) -> StoreResult<Option<Account>> {
        let email = email.trim().to_lowercase();
        let inner = self.lock();
        Ok(inner
            .accounts
            .values()
            .find(|account| account.email == email)
            .cloned())
    }

    async fn find_account_by_username_any(&self, username: &str) -> StoreResult<Option<Account>> {
        let inner = self.lock();
        Ok(inner
            .accounts
            .values()
            .find(|account| account.username == username)
            .cloned())
    }

    async fn find_first_account(&self) -> StoreResult<Option<Account>> {
        let inner = self.lock();
        Ok(inner
            .accounts
            .values()
            .min_by_key(|account| account.created_at)
            .cloned())
    }

    async fn update_account(
        &self,
        account_id: Uuid,
        mut updates: UpdateAccount,
        now: Timestamp,
    ) -> StoreResult<Option<Account>> {
        if let Some(username) = updates.username.as_mut() {
            *username = username.trim().to_owned();
        }
        if let Some(email) = updates.email.as_mut() {
            *email = email.trim().to_lowercase();
        }

        let mut inner = self.lock();

        let Some(current) = inner
            .accounts
            .get(&account_id)
            .filter(|account| !account.is_deleted())
        else {
            return Ok(None);
        };

        if let Some(email) = updates.email.as_deref()
            && email != current.email
            && let Some(conflict) = inner.unique_conflict(UniqueField::Email, email, Some(account_id))
        {
            return Err(conflict);
        }
        if let Some(username) = updates.username.as_deref()
            && username != current.username
            && let Some(conflict) =
                inner.unique_conflict(UniqueField::Username, username, Some(account_id))
        {
            return Err(conflict);
        }

        let Some(account) = inner.accounts.get_mut(&account_id) else {
            return Ok(None);
        };

        if let Some(username) = updates.username {
            account.username = username;
        }
        if let Some(email) = updates.email {
            account.email = email;
        }
        if let Some(password_hash) = updates.password_hash {
            account.password_hash = password_hash;
        }
        if let Some(locale) = updates.locale {
            account.locale = locale;
        }
        if let Some(verified_at) = updates.verified_at {
            account.verified_at = Some(verified_at);
        }
        if let Some(token) = updates.password_reset_token {
            account.password_reset_token = token;
        }
        if let Some(expires_at) = updates.password_reset_expires_at {
            account.password_reset_expires_at = expires_at;
        }
        account.updated_at = now;

        Ok(Some(account.clone()))
    }

    async fn delete_account(
        &self,
        account_id: Uuid,
        now: Timestamp,
    ) -> StoreResult<Option<Account>> {
        let mut inner = self.lock();

        let Some(account) = inner
            .accounts
            .get_mut(&account_id)
            .filter(|account| !account.is_deleted())
        else {
            return Ok(None);
        };

        account.deleted_at = Some(now);
        account.updated_at = now;

        tracing::debug!(
            target: TRACING_TARGET_STORE,
            account_id = %account_id,
            "account soft-deleted"
        );

        Ok(Some(account.clone()))
    }
}

impl SessionStore for MemoryStore {
    async fn create_session(&self, new_session: NewSession) -> StoreResult<Session> {
        let session = Session {
            id: Uuid::new_v4(),
            account_id: new_session.account_id,
            refresh_token: new_session.refresh_token,
            kind: new_session.kind,
            client_ip: new_session.client_ip,
            user_agent: new_session.user_agent,
            created_at: new_session.created_at,
            last_used_at: new_session.created_at,
            expires_at: new_session.expires_at,
        };

        let mut inner = self.lock();
        inner.sessions.insert(session.id, session.clone());

        tracing::debug!(
            target: TRACING_TARGET_STORE,
            session_id = %session.id,
            account_id = %session.account_id,
            kind = %session.kind,
            "session created"
        );

        Ok(session)
    }

    async fn find_session_by_id(
        &self,
        session_id: Uuid,
        now: Timestamp,
    ) -> StoreResult<Option<Session>> {
        let inner = self.lock();
        Ok(inner
            .sessions
            .get(&session_id)
            .filter(|session| session.is_active(now))
            .cloned())
    }

    async fn find_session_by_token(
        &self,
        refresh_token: &str,
        now: Timestamp,
    ) -> StoreResult<Option<Session>> {
        let inner = self.lock();
        Ok(inner
            .sessions
            .values()
            .find(|session| session.refresh_token == refresh_token && session.is_active(now))
            .cloned())
    }

    async fn find_session_by_token_any(&self, refresh_token: &str) -> StoreResult<Option<Session>> {
        let inner = self.lock();
        Ok(inner
            .sessions
            .values()
            .find(|session| session.refresh_token == refresh_token)
            .cloned())
    }

    async fn list_sessions_for_account(
        &self,
        account_id: Uuid,
        now: Timestamp,
    ) -> StoreResult<Vec<Session>> {
        let inner = self.lock();
        let mut sessions: Vec<Session> = inner
            .sessions
            .values()
            .filter(|session| session.account_id == account_id && session.is_active(now))
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.last_used_at.cmp(&a.last_used_at));
        Ok(sessions)
    }

    async fn rotate_session(
        &self,
        refresh_token: &str,
        rotate: RotateSession,
    ) -> StoreResult<Option<Session>> {
        let mut inner = self.lock();

        // Token match and replacement happen under one lock acquisition:
        // the losing side of a rotation race no longer finds the token.
        let Some(session) = inner
            .sessions
            .values_mut()
            .find(|session| session.refresh_token == refresh_token && session.is_active(rotate.now))
        else {
            return Ok(None);
        };

        session.refresh_token = rotate.refresh_token;
        session.client_ip = rotate.client_ip;
        session.last_used_at = rotate.now;
        session.expires_at = rotate.expires_at;

        tracing::debug!(
            target: TRACING_TARGET_STORE,
            session_id = %session.id,
            account_id = %session.account_id,
            "session rotated"
        );

        Ok(Some(session.clone()))
    }

    async fn revoke_session(&self, session_id: Uuid, now: Timestamp) -> StoreResult<bool> {
        let mut inner = self.lock();

        let Some(session) = inner
            .sessions
            .get_mut(&session_id)
            .filter(|session| session.is_active(now))
        else {
            return Ok(false);
        };

        session.expires_at = now;
        Ok(true)
    }

    async fn revoke_session_by_token(
        &self,
        refresh_token: &str,
        now: Timestamp,
    ) -> StoreResult<bool> {
        let mut inner = self.lock();

        let Some(session) = inner
            .sessions
            .values_mut()
            .find(|session| session.refresh_token == refresh_token && session.is_active(now))
        else {
            return Ok(false);
        };

        session.expires_at = now;
        Ok(true)
    }

    async fn revoke_all_for_account(&self, account_id: Uuid, now: Timestamp) -> StoreResult<u64> {
        let mut inner = self.lock();

        let mut revoked = 0;
        for session in inner
            .sessions
            .values_mut()
            .filter(|session| session.account_id == account_id && session.is_active(now))
        {
            session.expires_at = now;
            revoked += 1;
        }

        Ok(revoked)
    }
}
