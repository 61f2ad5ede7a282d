//! Injectable time source.
//!
//! Token expiry and session rotation are all defined relative to "now", so
//! every read of the current instant goes through [`Clock`]. Production code
//! uses [`SystemClock`]; tests drive a [`ManualClock`] to cross expiry
//! boundaries without sleeping.

use std::fmt;
use std::sync::{Arc, Mutex};

use jiff::{Span, Timestamp};

/// Source of the current instant.
pub trait Clock: fmt::Debug + Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> Timestamp;
}

/// Wall-clock time via [`Timestamp::now`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// Manually advanced clock.
///
/// Clones share the same underlying instant, so a test can hold one handle
/// while the service under test holds another.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Timestamp>>,
}

impl ManualClock {
    /// Creates a clock frozen at `start`.
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    /// Moves the clock forward by `span`.
    ///
    /// Only absolute units (hours and smaller) are meaningful here; the
    /// clock has no time zone to resolve calendar units against.
    pub fn advance(&self, span: Span) {
        let mut now = self.now.lock().expect("clock mutex poisoned");
        *now = *now + span;
    }

    /// Jumps the clock to an absolute instant.
    pub fn set(&self, to: Timestamp) {
        let mut now = self.now.lock().expect("clock mutex poisoned");
        *now = to;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Timestamp::UNIX_EPOCH)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.now.lock().expect("clock mutex poisoned")
    }
}
