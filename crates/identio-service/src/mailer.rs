//! Outbound mail boundary.
//!
//! The service never renders or delivers email itself; it hands a
//! [`Mail`] (recipient, template key, structured data) to a [`Mailer`]
//! collaborator. Delivery is fire-and-forget from the service's
//! perspective: a failure is reported to the caller, but the account or
//! token mutation that triggered it is never rolled back.

use std::future::Future;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, IntoStaticStr};

use crate::TRACING_TARGET_MAILER as TRACING_TARGET;

/// Template key for an outbound message; rendering is a collaborator
/// concern, keyed by template and the recipient's locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[derive(Serialize, Deserialize, AsRefStr, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum MailTemplate {
    /// Email ownership verification with a single-use token.
    #[serde(rename = "email_verification")]
    EmailVerification,
    /// Password recovery with a single-use, time-boxed token.
    #[serde(rename = "password_reset")]
    PasswordReset,
}

/// An outbound message request.
#[derive(Debug, Clone, Serialize)]
pub struct Mail {
    /// Recipient address.
    pub to: String,
    /// Recipient's preferred language tag.
    pub locale: String,
    /// Which template to render.
    pub template: MailTemplate,
    /// Template data (tokens, names, expiry instants).
    pub data: serde_json::Value,
}

/// The error type for mail delivery failures.
#[derive(Debug, Clone, thiserror::Error)]
#[error("mail delivery failed: {0}")]
pub struct MailerError(pub String);

/// Outbound mail collaborator.
pub trait Mailer: Send + Sync {
    /// Requests delivery of one message.
    fn send(&self, mail: Mail) -> impl Future<Output = Result<(), MailerError>> + Send;
}

/// Outcome of a best-effort mail request attached to an operation result.
#[derive(Debug, Clone)]
pub enum MailDelivery {
    /// The mailer accepted the message.
    Sent,
    /// The mailer failed; the triggering mutation is still persisted.
    Failed(MailerError),
}

impl MailDelivery {
    /// Returns whether the message was accepted.
    pub fn is_sent(&self) -> bool {
        matches!(self, MailDelivery::Sent)
    }
}

/// Mailer that logs instead of delivering.
///
/// Default collaborator for deployments without outbound mail; pairs with
/// a policy that does not require verified email addresses.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleMailer;

impl Mailer for ConsoleMailer {
    async fn send(&self, mail: Mail) -> Result<(), MailerError> {
        tracing::info!(
            target: TRACING_TARGET,
            to = %mail.to,
            locale = %mail.locale,
            template = %mail.template,
            "mail delivery skipped (console mailer)"
        );
        Ok(())
    }
}
