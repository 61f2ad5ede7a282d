//! The identity service composition root.

mod accounts;
mod sessions;

use std::sync::Arc;

use identio_core::{Clock, IdentityConfig, SystemClock, SystemTokens, TokenSource};
use identio_data::model::Account;
use identio_data::query::{AccountStore, SessionStore};
use jiff::{Span, Timestamp};

pub use accounts::{NewRegistration, PasswordResetRequest, ProfileUpdate, Registered};

use crate::error::{Error, Result};
use crate::hasher::CredentialHasher;
use crate::mailer::Mailer;

/// The identity and session core.
///
/// Orchestrates the credential hasher, the validation rule-chains, and the
/// storage boundary to implement registration, authentication, email
/// proofing, password recovery, and refresh-token session management.
/// Policy lives in the [`IdentityConfig`] handed to the constructor; time
/// and token entropy come from injectable collaborators so every expiry
/// decision is testable.
#[derive(Debug)]
pub struct IdentityService<S, M> {
    config: IdentityConfig,
    store: S,
    mailer: M,
    hasher: CredentialHasher,
    clock: Arc<dyn Clock>,
    tokens: Arc<dyn TokenSource>,
}

impl<S, M> IdentityService<S, M>
where
    S: AccountStore + SessionStore,
    M: Mailer,
{
    /// Creates a service over the given store and mailer.
    ///
    /// Uses the system clock and the system token source; tests swap them
    /// via [`with_clock`](Self::with_clock) and
    /// [`with_token_source`](Self::with_token_source).
    pub fn new(config: IdentityConfig, store: S, mailer: M) -> Result<Self> {
        Ok(Self {
            config,
            store,
            mailer,
            hasher: CredentialHasher::new()?,
            clock: Arc::new(SystemClock),
            tokens: Arc::new(SystemTokens),
        })
    }

    /// Replaces the clock collaborator.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Replaces the token source collaborator.
    pub fn with_token_source(mut self, tokens: impl TokenSource + 'static) -> Self {
        self.tokens = Arc::new(tokens);
        self
    }

    /// Returns the active policy configuration.
    pub fn config(&self) -> &IdentityConfig {
        &self.config
    }

    /// Returns an account by id.
    pub async fn account(&self, account_id: uuid::Uuid) -> Result<Account> {
        self.store
            .find_account_by_id(account_id)
            .await?
            .ok_or(Error::NotFound)
    }

    /// Returns an account by username or email address.
    ///
    /// The login is tried as a username first, then as an email address,
    /// matching how users type either into the same field.
    pub async fn account_by_login(&self, login: &str) -> Result<Account> {
        self.find_account_by_login(login)
            .await?
            .ok_or(Error::NotFound)
    }

    pub(crate) async fn find_account_by_login(&self, login: &str) -> Result<Option<Account>> {
        if let Some(account) = self.store.find_account_by_username(login).await? {
            return Ok(Some(account));
        }
        Ok(self.store.find_account_by_email(login).await?)
    }

    pub(crate) fn now(&self) -> Timestamp {
        self.clock.now()
    }

    pub(crate) fn deadline(&self, from: Timestamp, ttl: Span) -> Result<Timestamp> {
        from.checked_add(ttl).map_err(Error::internal)
    }

    pub(crate) fn fresh_token(&self) -> Result<String> {
        self.tokens.token().map_err(Error::internal)
    }
}
