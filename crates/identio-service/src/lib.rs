#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for account lifecycle operations.
pub const TRACING_TARGET_ACCOUNTS: &str = "identio_service::accounts";

/// Tracing target for session operations.
pub const TRACING_TARGET_SESSIONS: &str = "identio_service::sessions";

/// Tracing target for credential hashing.
pub const TRACING_TARGET_HASHER: &str = "identio_service::hasher";

/// Tracing target for outbound mail.
pub const TRACING_TARGET_MAILER: &str = "identio_service::mailer";

mod error;
mod hasher;
mod mailer;
mod service;
pub mod validate;

pub use error::{BoxedError, ConflictReason, Error, ErrorKind, Result};
pub use hasher::{CredentialHasher, HasherError};
pub use mailer::{ConsoleMailer, Mail, MailDelivery, MailTemplate, Mailer, MailerError};
pub use service::{
    IdentityService, NewRegistration, PasswordResetRequest, ProfileUpdate, Registered,
};
