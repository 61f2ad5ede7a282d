//! Account lifecycle operations.

use identio_data::model::{Account, NewAccount, UpdateAccount};
use identio_data::query::{AccountStore, SessionStore};
use jiff::Timestamp;
use serde_json::json;
use uuid::Uuid;

use super::IdentityService;
use crate::TRACING_TARGET_ACCOUNTS as TRACING_TARGET;
use crate::error::{Error, Result};
use crate::mailer::{Mail, MailDelivery, MailTemplate, Mailer};
use crate::validate;

/// Input for creating a new account.
#[derive(Debug, Clone)]
pub struct NewRegistration {
    /// Requested login name.
    pub username: String,
    /// Email address to verify.
    pub email: String,
    /// Plaintext password, hashed before it ever reaches storage.
    pub password: String,
    /// Preferred language tag for outbound mail.
    pub locale: String,
}

/// Outcome of a successful registration.
#[derive(Debug)]
pub struct Registered {
    /// The created account.
    pub account: Account,
    /// Whether the verification mail was accepted by the mailer.
    ///
    /// A failed delivery never undoes the registration; the caller decides
    /// whether to surface it or rely on a later resend.
    pub verification_mail: MailDelivery,
}

/// Partial profile update; absent fields stay unchanged.
#[derive(Debug, Default, Clone)]
pub struct ProfileUpdate {
    /// New login name.
    pub username: Option<String>,
    /// New email address.
    pub email: Option<String>,
    /// New plaintext password; hashed before storage.
    pub password: Option<String>,
    /// New preferred language tag.
    pub locale: Option<String>,
}

/// Outcome of a password-reset request.
#[derive(Debug)]
pub struct PasswordResetRequest {
    /// The single-use reset token, also embedded in the mail data.
    pub token: String,
    /// When the token stops being accepted.
    pub expires_at: Timestamp,
    /// Whether the reset mail was accepted by the mailer.
    pub mail: MailDelivery,
}

impl<S, M> IdentityService<S, M>
where
    S: AccountStore + SessionStore,
    M: Mailer,
{
    /// Registers a new account.
    ///
    /// Validates the email shape and the username and password rule-sets,
    /// hashes the password, and creates the account with a fresh
    /// verification token. Uniqueness (including the distinct
    /// "deactivated" conflict for soft-deleted holders) and the
    /// first-account admin election happen atomically inside the store.
    pub async fn register(&self, registration: NewRegistration) -> Result<Registered> {
        let username = registration.username.trim().to_owned();
        let email = registration.email.trim().to_lowercase();

        validate::validate_email(&email, self.config.max_email_length)?;
        validate::username_rules().validate(&username)?;
        validate::password_rules(&[username.as_str(), email.as_str()], self.config.max_similarity)
            .validate(&registration.password)?;

        let password_hash = self.hasher.hash(&registration.password)?;
        let verification_token = self.fresh_token()?;

        let account = self
            .store
            .create_account(NewAccount {
                username,
                email,
                password_hash,
                verification_token,
                locale: registration.locale,
                created_at: self.now(),
            })
            .await?;

        tracing::info!(
            target: TRACING_TARGET,
            account_id = %account.id,
            username = %account.username,
            is_admin = account.is_admin,
            "account registered"
        );

        let verification_mail = self.send_verification_mail(&account).await;

        Ok(Registered {
            account,
            verification_mail,
        })
    }

    /// Authenticates a login (username or email) with a password.
    ///
    /// Unknown logins and wrong passwords are indistinguishable in the
    /// returned error; a dummy hash verification keeps the unknown-login
    /// path as slow as the real one so account existence does not leak
    /// through timing. Unverified accounts fail distinctly when policy
    /// requires verification.
    pub async fn authenticate(&self, login: &str, password: &str) -> Result<Account> {
        let account = self.find_account_by_login(login).await?;

        let password_valid = match &account {
            Some(account) => self.hasher.verify(password, &account.password_hash)?,
            None => self.hasher.verify_dummy(password),
        };

        let Some(account) = account else {
            tracing::debug!(
                target: TRACING_TARGET,
                reason = "unknown_login",
                "authentication failed"
            );
            return Err(Error::InvalidCredentials);
        };

        if !password_valid {
            tracing::debug!(
                target: TRACING_TARGET,
                account_id = %account.id,
                reason = "wrong_password",
                "authentication failed"
            );
            return Err(Error::InvalidCredentials);
        }

        if self.config.require_verified_email && !account.is_verified() {
            tracing::debug!(
                target: TRACING_TARGET,
                account_id = %account.id,
                reason = "unverified",
                "authentication failed"
            );
            return Err(Error::Unverified);
        }

        tracing::info!(
            target: TRACING_TARGET,
            account_id = %account.id,
            "authentication succeeded"
        );

        Ok(account)
    }

    /// Consumes an email verification token.
    ///
    /// Exact-match lookup; a token presented again after a successful
    /// verification reports [`Error::AlreadyVerified`] rather than
    /// silently succeeding, so replays are visible to the caller.
    pub async fn verify_email(&self, token: &str) -> Result<Account> {
        let Some(account) = self.store.find_account_by_verification_token(token).await? else {
            return Err(Error::InvalidToken);
        };

        if account.is_verified() {
            return Err(Error::AlreadyVerified);
        }

        let now = self.now();
        let verified = self
            .store
            .update_account(
                account.id,
                UpdateAccount {
                    verified_at: Some(now),
                    ..Default::default()
                },
                now,
            )
            .await?
            .ok_or(Error::NotFound)?;

        tracing::info!(
            target: TRACING_TARGET,
            account_id = %verified.id,
            "email verified"
        );

        Ok(verified)
    }

    /// Re-sends the verification mail for a still-unverified account.
    ///
    /// `NotFound` is returned to the caller; transports mask it behind a
    /// generic "check your email" response to prevent account enumeration.
    pub async fn resend_verification(&self, login: &str) -> Result<()> {
        let account = self.account_by_login(login).await?;

        if account.is_verified() {
            return Err(Error::AlreadyVerified);
        }

        match self.send_verification_mail(&account).await {
            MailDelivery::Sent => Ok(()),
            MailDelivery::Failed(err) => Err(Error::Mail(err)),
        }
    }

    /// Starts a password reset for an account.
    ///
    /// Issues a fresh single-use token expiring after the configured TTL,
    /// overwriting any pending reset, then requests the recovery mail. The
    /// token mutation is persisted before the mail is attempted and is
    /// never rolled back on delivery failure. As with
    /// [`resend_verification`](Self::resend_verification), `NotFound`
    /// masking is the transport's concern.
    pub async fn request_password_reset(&self, login: &str) -> Result<PasswordResetRequest> {
        let account = self.account_by_login(login).await?;

        let token = self.fresh_token()?;
        let now = self.now();
        let expires_at = self.deadline(now, self.config.reset_token_ttl)?;

        let account = self
            .store
            .update_account(
                account.id,
                UpdateAccount {
                    password_reset_token: Some(Some(token.clone())),
                    password_reset_expires_at: Some(Some(expires_at)),
                    ..Default::default()
                },
                now,
            )
            .await?
            .ok_or(Error::NotFound)?;

        tracing::info!(
            target: TRACING_TARGET,
            account_id = %account.id,
            "password reset requested"
        );

        let mail = self
            .send_mail(
                &account,
                MailTemplate::PasswordReset,
                json!({
                    "username": account.username,
                    "token": token,
                    "expires_at": expires_at,
                }),
            )
            .await;

        Ok(PasswordResetRequest {
            token,
            expires_at,
            mail,
        })
    }

    /// Completes a password reset with a single-use token.
    ///
    /// The token must exist and be inside its validity window; the new
    /// password is validated against the owning account's username and
    /// email. On success the reset pair is cleared (the token can never
    /// authorize a second reset) and every live session of the account is
    /// revoked, since the credential they were minted under is gone.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<Account> {
        let Some(account) = self
            .store
            .find_account_by_password_reset_token(token)
            .await?
        else {
            return Err(Error::InvalidToken);
        };

        let now = self.now();
        if !account.has_pending_reset(now) {
            return Err(Error::TokenExpired);
        }

        validate::password_rules(
            &[account.username.as_str(), account.email.as_str()],
            self.config.max_similarity,
        )
        .validate(new_password)?;

        let password_hash = self.hasher.hash(new_password)?;
        let account = self
            .store
            .update_account(
                account.id,
                UpdateAccount {
                    password_hash: Some(password_hash),
                    password_reset_token: Some(None),
                    password_reset_expires_at: Some(None),
                    ..Default::default()
                },
                now,
            )
            .await?
            .ok_or(Error::NotFound)?;

        let revoked = self.store.revoke_all_for_account(account.id, now).await?;

        tracing::info!(
            target: TRACING_TARGET,
            account_id = %account.id,
            sessions_revoked = revoked,
            "password reset completed"
        );

        Ok(account)
    }

    /// Applies a partial profile update.
    ///
    /// Changed fields go through exactly the same validation and atomic
    /// uniqueness checks as registration; the password is re-hashed only
    /// when a new one is supplied.
    pub async fn update_profile(&self, account_id: Uuid, update: ProfileUpdate) -> Result<Account> {
        let account = self.account(account_id).await?;

        let username = update.username.map(|username| username.trim().to_owned());
        let email = update.email.map(|email| email.trim().to_lowercase());

        if let Some(email) = email.as_deref() {
            validate::validate_email(email, self.config.max_email_length)?;
        }
        if let Some(username) = username.as_deref() {
            validate::username_rules().validate(username)?;
        }

        let password_hash = match update.password.as_deref() {
            Some(password) => {
                // Similarity is judged against the values the account will
                // hold after this update.
                let effective_username = username.as_deref().unwrap_or(&account.username);
                let effective_email = email.as_deref().unwrap_or(&account.email);
                validate::password_rules(
                    &[effective_username, effective_email],
                    self.config.max_similarity,
                )
                .validate(password)?;
                Some(self.hasher.hash(password)?)
            }
            None => None,
        };

        let updated = self
            .store
            .update_account(
                account.id,
                UpdateAccount {
                    username,
                    email,
                    password_hash,
                    locale: update.locale,
                    ..Default::default()
                },
                self.now(),
            )
            .await?
            .ok_or(Error::NotFound)?;

        tracing::info!(
            target: TRACING_TARGET,
            account_id = %updated.id,
            "profile updated"
        );

        Ok(updated)
    }

    /// Soft-deletes an account and revokes all of its sessions.
    ///
    /// The record is kept for audit but behaves as not-found everywhere; a
    /// later registration reusing the username or email surfaces the
    /// distinct "deactivated" conflict.
    pub async fn delete_account(&self, account_id: Uuid) -> Result<Account> {
        let now = self.now();
        let deleted = self
            .store
            .delete_account(account_id, now)
            .await?
            .ok_or(Error::NotFound)?;

        let revoked = self.store.revoke_all_for_account(account_id, now).await?;

        tracing::info!(
            target: TRACING_TARGET,
            account_id = %account_id,
            sessions_revoked = revoked,
            "account deleted"
        );

        Ok(deleted)
    }

    async fn send_verification_mail(&self, account: &Account) -> MailDelivery {
        self.send_mail(
            account,
            MailTemplate::EmailVerification,
            json!({
                "username": account.username,
                "token": account.verification_token,
            }),
        )
        .await
    }

    async fn send_mail(
        &self,
        account: &Account,
        template: MailTemplate,
        data: serde_json::Value,
    ) -> MailDelivery {
        let mail = Mail {
            to: account.email.clone(),
            locale: account.locale.clone(),
            template,
            data,
        };

        match self.mailer.send(mail).await {
            Ok(()) => MailDelivery::Sent,
            Err(err) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    account_id = %account.id,
                    template = %template,
                    error = %err,
                    "mail delivery failed"
                );
                MailDelivery::Failed(err)
            }
        }
    }
}
