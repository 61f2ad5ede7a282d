#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for store operations.
pub const TRACING_TARGET_STORE: &str = "identio_data::store";

mod memory;
pub mod model;
pub mod query;

pub use memory::MemoryStore;

use strum::{AsRefStr, Display, EnumString, IntoStaticStr};

/// Type-erased error type for dynamic error handling.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Account field covered by a uniqueness guarantee.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[derive(AsRefStr, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum UniqueField {
    /// The account username.
    Username,
    /// The account email address.
    Email,
}

/// Error type for storage-boundary operations.
#[derive(Debug, thiserror::Error)]
#[must_use = "storage errors should be handled appropriately"]
pub enum StoreError {
    /// A unique field collided with an existing account.
    ///
    /// `deactivated` is true when the colliding account is soft-deleted;
    /// callers surface that as a distinct conflict so the user can be told
    /// the identity exists but is deactivated, rather than plainly taken.
    #[error("account {field} is already in use")]
    Conflict {
        /// The field that collided.
        field: UniqueField,
        /// Whether the colliding account is soft-deleted.
        deactivated: bool,
    },

    /// The storage backend failed or is unreachable.
    ///
    /// Retry policy belongs to the caller; this crate never retries.
    #[error("storage backend unavailable: {0}")]
    Unavailable(#[source] BoxedError),
}

impl StoreError {
    /// Returns the conflicting field, if this is a uniqueness conflict.
    pub fn conflict(&self) -> Option<(UniqueField, bool)> {
        match self {
            StoreError::Conflict { field, deactivated } => Some((*field, *deactivated)),
            StoreError::Unavailable(_) => None,
        }
    }
}

/// Specialized [`Result`] type for storage-boundary operations.
pub type StoreResult<T, E = StoreError> = Result<T, E>;
