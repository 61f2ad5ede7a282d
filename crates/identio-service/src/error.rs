//! Error taxonomy of the identity service.
//!
//! Every operation resolves to one of the kinds below. Variants carry just
//! enough structure for a transport layer to localize a message; the
//! service itself never produces user-facing sentences. Internal failures
//! (storage, hashing) are surfaced as-is and never retried here; retry
//! policy belongs to the caller.

use identio_data::{StoreError, UniqueField};
use strum::{AsRefStr, Display, IntoStaticStr};

use crate::hasher::HasherError;
use crate::mailer::MailerError;
use crate::validate::RuleViolation;

/// Type-erased error type for dynamic error handling.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Specialized [`Result`] type for identity operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Why a unique field conflicted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[derive(AsRefStr, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ConflictReason {
    /// A live account already holds the value.
    Exists,
    /// A deactivated (soft-deleted) account holds the value.
    Deactivated,
}

/// Categories of identity errors, for transport mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[derive(AsRefStr, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// Input failed a validation rule.
    Validation,
    /// A unique field is already taken.
    Conflict,
    /// The referenced account or session does not exist.
    NotFound,
    /// Unknown login or wrong password; callers cannot tell which.
    InvalidCredentials,
    /// The account has not completed email verification.
    Unverified,
    /// The presented token does not resolve to anything.
    InvalidToken,
    /// The presented token exists but its validity window is over.
    TokenExpired,
    /// The account is already verified.
    AlreadyVerified,
    /// Outbound mail could not be delivered.
    Mail,
    /// Storage or hashing failure.
    Internal,
}

/// The error type for identity operations.
#[derive(Debug, thiserror::Error)]
#[must_use = "identity errors should be handled appropriately"]
pub enum Error {
    /// Input failed a validation rule; carries the first violated rule.
    #[error("validation failed: {0}")]
    Validation(#[from] RuleViolation),

    /// A unique field is already taken.
    #[error("{field} conflict: {reason}")]
    Conflict {
        /// The conflicting field.
        field: UniqueField,
        /// Whether the holder is live or deactivated.
        reason: ConflictReason,
    },

    /// The referenced account or session does not exist.
    #[error("not found")]
    NotFound,

    /// Unknown login or wrong password.
    ///
    /// Callers cannot tell the two cases apart; the specific reason is
    /// only ever emitted to tracing for operator-side diagnosis.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The account has not completed email verification.
    #[error("email address not verified")]
    Unverified,

    /// The presented token does not resolve to anything.
    #[error("invalid token")]
    InvalidToken,

    /// The presented token exists but its validity window is over.
    #[error("token expired")]
    TokenExpired,

    /// The account is already verified.
    #[error("email address already verified")]
    AlreadyVerified,

    /// Outbound mail could not be delivered.
    ///
    /// The account or token mutation that triggered the mail has already
    /// been persisted; only the delivery failed.
    #[error(transparent)]
    Mail(#[from] MailerError),

    /// Storage or hashing failure, surfaced as-is.
    #[error("internal error: {0}")]
    Internal(#[source] BoxedError),
}

impl Error {
    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) => ErrorKind::Validation,
            Error::Conflict { .. } => ErrorKind::Conflict,
            Error::NotFound => ErrorKind::NotFound,
            Error::InvalidCredentials => ErrorKind::InvalidCredentials,
            Error::Unverified => ErrorKind::Unverified,
            Error::InvalidToken => ErrorKind::InvalidToken,
            Error::TokenExpired => ErrorKind::TokenExpired,
            Error::AlreadyVerified => ErrorKind::AlreadyVerified,
            Error::Mail(_) => ErrorKind::Mail,
            Error::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Wraps an arbitrary failure as an internal error.
    pub fn internal(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Error::Internal(Box::new(source))
    }

    /// Returns the violated rule, if this is a validation error.
    pub fn violation(&self) -> Option<RuleViolation> {
        match self {
            Error::Validation(violation) => Some(*violation),
            _ => None,
        }
    }

    /// Returns the conflicting field and reason, if this is a conflict.
    pub fn conflict(&self) -> Option<(UniqueField, ConflictReason)> {
        match self {
            Error::Conflict { field, reason } => Some((*field, *reason)),
            _ => None,
        }
    }
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { field, deactivated } => Error::Conflict {
                field,
                reason: if deactivated {
                    ConflictReason::Deactivated
                } else {
                    ConflictReason::Exists
                },
            },
            StoreError::Unavailable(source) => Error::Internal(source),
        }
    }
}

impl From<HasherError> for Error {
    fn from(err: HasherError) -> Self {
        Error::Internal(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_serialize_as_snake_case() {
        assert_eq!(ErrorKind::InvalidCredentials.as_ref(), "invalid_credentials");
        assert_eq!(ErrorKind::TokenExpired.as_ref(), "token_expired");
        assert_eq!(ConflictReason::Deactivated.as_ref(), "deactivated");
    }

    #[test]
    fn store_conflicts_map_to_conflict_reasons() {
        let live: Error = StoreError::Conflict {
            field: UniqueField::Email,
            deactivated: false,
        }
        .into();
        assert_eq!(
            live.conflict(),
            Some((UniqueField::Email, ConflictReason::Exists))
        );

        let gone: Error = StoreError::Conflict {
            field: UniqueField::Username,
            deactivated: true,
        }
        .into();
        assert_eq!(gone.kind(), ErrorKind::Conflict);
        assert_eq!(
            gone.conflict(),
            Some((UniqueField::Username, ConflictReason::Deactivated))
        );
    }
}
