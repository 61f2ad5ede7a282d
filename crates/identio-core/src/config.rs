//! Identity policy configuration.

use jiff::Span;

/// Policy knobs for the identity service.
///
/// All thresholds live here and are handed to the service constructor;
/// business logic never reads the process environment.
#[derive(Debug, Clone, Copy)]
pub struct IdentityConfig {
    /// Whether authentication requires a verified email address.
    ///
    /// Deployments without an outbound mailer leave this off, since users
    /// would have no way to complete verification.
    pub require_verified_email: bool,
    /// Maximum tolerated similarity between a password and the account's
    /// username or email, in `[0, 1]`.
    pub max_similarity: f64,
    /// Lifetime of a password-reset token.
    pub reset_token_ttl: Span,
    /// Sliding lifetime of a refresh-token session, renewed on every
    /// successful rotation.
    pub session_ttl: Span,
    /// Maximum accepted email address length.
    pub max_email_length: usize,
}

impl IdentityConfig {
    /// Creates the default policy set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the verified-email requirement.
    pub fn with_require_verified_email(mut self, required: bool) -> Self {
        self.require_verified_email = required;
        self
    }

    /// Overrides the password similarity ceiling.
    pub fn with_max_similarity(mut self, max_similarity: f64) -> Self {
        self.max_similarity = max_similarity;
        self
    }

    /// Overrides the password-reset token lifetime.
    pub fn with_reset_token_ttl(mut self, ttl: Span) -> Self {
        self.reset_token_ttl = ttl;
        self
    }

    /// Overrides the session lifetime.
    pub fn with_session_ttl(mut self, ttl: Span) -> Self {
        self.session_ttl = ttl;
        self
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            require_verified_email: false,
            max_similarity: 0.7,
            reset_token_ttl: Span::new().hours(4),
            session_ttl: Span::new().hours(90 * 24),
            max_email_length: 100,
        }
    }
}
