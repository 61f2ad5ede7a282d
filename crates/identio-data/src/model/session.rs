//! Refresh-token session record for identity storage.

use ipnet::IpNet;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString, IntoStaticStr};
use uuid::Uuid;

/// Trust level of a session, fixed at creation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[derive(Serialize, Deserialize, AsRefStr, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum SessionKind {
    /// Interactive user session (browser or native client).
    #[serde(rename = "user")]
    #[default]
    User,
    /// Machine-to-machine session (programmatic access).
    #[serde(rename = "api")]
    Api,
}

impl SessionKind {
    /// Returns whether this session belongs to an interactive client.
    #[inline]
    pub fn is_interactive(self) -> bool {
        matches!(self, SessionKind::User)
    }
}

/// A long-lived refresh-token session bound to an account.
///
/// The refresh token is single-use: every successful rotation replaces it
/// and slides `expires_at` forward by the full session TTL. Revocation sets
/// `expires_at` to the revocation instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    /// Unique session identifier.
    pub id: Uuid,
    /// The owning account.
    pub account_id: Uuid,
    /// High-entropy opaque secret, unique, replaced on every rotation.
    #[serde(skip_serializing)]
    pub refresh_token: String,
    /// Trust level, immutable after creation.
    pub kind: SessionKind,
    /// Client address recorded at creation and on each rotation.
    ///
    /// Provenance metadata for audit only, never an authorization input.
    pub client_ip: IpNet,
    /// Client user agent recorded at creation and on each rotation.
    pub user_agent: String,
    /// Timestamp when the session was created.
    pub created_at: Timestamp,
    /// Instant of the most recent rotation (creation instant if none).
    pub last_used_at: Timestamp,
    /// Expiry instant; recomputed as a sliding window on every rotation.
    pub expires_at: Timestamp,
}

/// Data for creating a new session.
#[derive(Debug, Clone)]
pub struct NewSession {
    /// The owning account.
    pub account_id: Uuid,
    /// Fresh high-entropy refresh token.
    pub refresh_token: String,
    /// Trust level of the session.
    pub kind: SessionKind,
    /// Client address at login.
    pub client_ip: IpNet,
    /// Client user agent at login.
    pub user_agent: String,
    /// Creation instant, read from the caller's clock.
    pub created_at: Timestamp,
    /// Initial expiry (creation instant plus the session TTL).
    pub expires_at: Timestamp,
}

/// Replacement values applied by one atomic refresh-token rotation.
#[derive(Debug, Clone)]
pub struct RotateSession {
    /// The replacement refresh token.
    pub refresh_token: String,
    /// Client address presenting the rotation.
    pub client_ip: IpNet,
    /// Rotation instant; becomes the session's `last_used_at` and is the
    /// instant expiry is checked against.
    pub now: Timestamp,
    /// New expiry (rotation instant plus the full session TTL).
    pub expires_at: Timestamp,
}

impl Session {
    /// Returns whether the session is expired (or revoked) at `now`.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expires_at <= now
    }

    /// Returns whether the session can still be rotated at `now`.
    pub fn is_active(&self, now: Timestamp) -> bool {
        !self.is_expired(now)
    }

    /// Returns a shortened session id for logging and display.
    pub fn id_short(&self) -> String {
        let id = self.id.to_string();
        format!("{}...", &id[..8])
    }
}
