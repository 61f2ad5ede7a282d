//! Shared fixtures for integration tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use identio_core::{IdentityConfig, ManualClock};
use identio_data::MemoryStore;
use identio_service::{IdentityService, Mail, Mailer, MailerError, NewRegistration};
use ipnet::IpNet;
use jiff::Timestamp;

/// Mailer that records every accepted message and can be switched into a
/// failing mode to exercise delivery-failure paths.
#[derive(Debug, Default, Clone)]
pub struct RecordingMailer {
    sent: Arc<Mutex<Vec<Mail>>>,
    failing: Arc<AtomicBool>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<Mail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl Mailer for RecordingMailer {
    async fn send(&self, mail: Mail) -> Result<(), MailerError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(MailerError("smtp unavailable".to_owned()));
        }
        self.sent.lock().unwrap().push(mail);
        Ok(())
    }
}

/// Service under test plus handles to all of its collaborators.
pub struct Harness {
    pub service: IdentityService<MemoryStore, RecordingMailer>,
    pub store: MemoryStore,
    pub clock: ManualClock,
    pub mailer: RecordingMailer,
}

pub fn harness() -> Harness {
    harness_with(IdentityConfig::default())
}

/// Installs a test subscriber once per binary; later calls are no-ops.
fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn harness_with(config: IdentityConfig) -> Harness {
    init_tracing();

    let store = MemoryStore::new();
    let clock = ManualClock::new(Timestamp::UNIX_EPOCH);
    let mailer = RecordingMailer::default();

    let service = IdentityService::new(config, store.clone(), mailer.clone())
        .expect("service construction")
        .with_clock(clock.clone());

    Harness {
        service,
        store,
        clock,
        mailer,
    }
}

pub fn registration(username: &str, email: &str) -> NewRegistration {
    NewRegistration {
        username: username.to_owned(),
        email: email.to_owned(),
        password: "Str0ng!Pass".to_owned(),
        locale: "en".to_owned(),
    }
}

pub fn client_ip() -> IpNet {
    "192.0.2.10/32".parse().expect("client ip")
}
