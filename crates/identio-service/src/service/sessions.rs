//! Refresh-token session operations.

use identio_data::model::{NewSession, RotateSession, Session, SessionKind};
use identio_data::query::{AccountStore, SessionStore};
use ipnet::IpNet;
use uuid::Uuid;

use super::IdentityService;
use crate::TRACING_TARGET_SESSIONS as TRACING_TARGET;
use crate::error::{Error, Result};
use crate::mailer::Mailer;

impl<S, M> IdentityService<S, M>
where
    S: AccountStore + SessionStore,
    M: Mailer,
{
    /// Opens a session for an account.
    ///
    /// Issues a fresh high-entropy refresh token and an expiry of the full
    /// session TTL from now. The account must exist and not be deleted.
    pub async fn create_session(
        &self,
        account_id: Uuid,
        client_ip: IpNet,
        user_agent: &str,
        kind: SessionKind,
    ) -> Result<Session> {
        let account = self.account(account_id).await?;

        let now = self.now();
        let session = self
            .store
            .create_session(NewSession {
                account_id: account.id,
                refresh_token: self.fresh_token()?,
                kind,
                client_ip,
                user_agent: user_agent.to_owned(),
                created_at: now,
                expires_at: self.deadline(now, self.config.session_ttl)?,
            })
            .await?;

        tracing::info!(
            target: TRACING_TARGET,
            session_id = %session.id,
            account_id = %account.id,
            kind = %session.kind,
            "session created"
        );

        Ok(session)
    }

    /// Rotates a session by its refresh token.
    ///
    /// The presented token is consumed and replaced in one atomic store
    /// operation; `expires_at` slides forward by the full TTL and the
    /// client address is re-recorded. A consumed, unknown, or revoked
    /// token is [`Error::InvalidToken`]; a token whose session sat past
    /// its window is [`Error::TokenExpired`]. Both are terminal: the
    /// caller re-authenticates, nothing revives a dead session.
    pub async fn refresh_session(&self, refresh_token: &str, client_ip: IpNet) -> Result<Session> {
        let now = self.now();

        let rotated = self
            .store
            .rotate_session(
                refresh_token,
                RotateSession {
                    refresh_token: self.fresh_token()?,
                    client_ip,
                    now,
                    expires_at: self.deadline(now, self.config.session_ttl)?,
                },
            )
            .await?;

        if let Some(session) = rotated {
            tracing::info!(
                target: TRACING_TARGET,
                session_id = %session.id,
                account_id = %session.account_id,
                "session rotated"
            );
            return Ok(session);
        }

        // Classification only: the rotation above is the single authority
        // on success, this read just picks the right terminal error.
        match self.store.find_session_by_token_any(refresh_token).await? {
            Some(session) if session.is_expired(now) => {
                tracing::debug!(
                    target: TRACING_TARGET,
                    session_id = %session.id,
                    reason = "expired",
                    "session rotation rejected"
                );
                Err(Error::TokenExpired)
            }
            _ => {
                tracing::debug!(
                    target: TRACING_TARGET,
                    reason = "unknown_token",
                    "session rotation rejected"
                );
                Err(Error::InvalidToken)
            }
        }
    }

    /// Returns an active session by id.
    pub async fn session(&self, session_id: Uuid) -> Result<Session> {
        self.store
            .find_session_by_id(session_id, self.now())
            .await?
            .ok_or(Error::NotFound)
    }

    /// Lists the active sessions of an account, most recently used first.
    pub async fn sessions(&self, account_id: Uuid) -> Result<Vec<Session>> {
        Ok(self
            .store
            .list_sessions_for_account(account_id, self.now())
            .await?)
    }

    /// Revokes a session by id. Idempotent.
    pub async fn revoke_session(&self, session_id: Uuid) -> Result<()> {
        let revoked = self.store.revoke_session(session_id, self.now()).await?;

        tracing::debug!(
            target: TRACING_TARGET,
            session_id = %session_id,
            revoked,
            "session revocation"
        );

        Ok(())
    }

    /// Revokes the session holding `refresh_token`. Idempotent.
    pub async fn revoke_session_by_token(&self, refresh_token: &str) -> Result<()> {
        let revoked = self
            .store
            .revoke_session_by_token(refresh_token, self.now())
            .await?;

        tracing::debug!(
            target: TRACING_TARGET,
            revoked,
            "session revocation by token"
        );

        Ok(())
    }

    /// Revokes every live session of an account, returning the count.
    pub async fn revoke_all_sessions(&self, account_id: Uuid) -> Result<u64> {
        let revoked = self
            .store
            .revoke_all_for_account(account_id, self.now())
            .await?;

        tracing::info!(
            target: TRACING_TARGET,
            account_id = %account_id,
            revoked,
            "all sessions revoked"
        );

        Ok(revoked)
    }
}
