//! Test fixtures and helpers.
//!
//! A [`TestFixture`] wires a [`PasteService`] to in-memory collaborators and a
//! manual clock, and keeps handles to all of them so tests can inspect side
//! effects and move time.

use std::sync::Arc;
use std::time::Duration;

use pastegate::{
    Collaborators, MemoryExpirationScheduler, Paste, PasteDraft, PasteService, Requester,
    ServiceConfig,
};
use pastegate_core::ManualClock;
use pastegate_perms::memory::MemoryAccountService;
use pastegate_perms::{AccountId, MemorySession};
use pastegate_render::{Formatter, LanguageRegistry};
use pastegate_store::{MemoryGrantStore, MemoryPasteStore};

use crate::formatters::CountingFormatter;

/// Start time of every fixture clock (2023-11-14T22:13:20Z).
pub const FIXTURE_EPOCH_MS: i64 = 1_700_000_000_000;

/// Source address used by [`TestFixture::create`].
pub const FIXTURE_SOURCE: &str = "192.0.2.1";

/// A paste service over in-memory collaborators.
pub struct TestFixture {
    pub clock: Arc<ManualClock>,
    pub pastes: Arc<MemoryPasteStore>,
    pub grants: Arc<MemoryGrantStore>,
    pub accounts: MemoryAccountService,
    pub formatter: Arc<CountingFormatter>,
    pub expirations: Arc<MemoryExpirationScheduler>,
    pub service: PasteService,
}

impl TestFixture {
    /// Create a fixture with the default configuration.
    pub fn new() -> Self {
        Self::with_config(ServiceConfig::default())
    }

    /// Create a fixture with a custom configuration.
    pub fn with_config(config: ServiceConfig) -> Self {
        Self::build(config, Arc::new(CountingFormatter::new()))
    }

    /// Create a fixture around a specific counting formatter.
    pub fn with_formatter(formatter: CountingFormatter) -> Self {
        Self::build(ServiceConfig::default(), Arc::new(formatter))
    }

    fn build(config: ServiceConfig, formatter: Arc<CountingFormatter>) -> Self {
        let clock = Arc::new(ManualClock::new(FIXTURE_EPOCH_MS));
        let pastes = Arc::new(MemoryPasteStore::new(clock.clone()));
        let grants = Arc::new(MemoryGrantStore::new());
        let accounts = MemoryAccountService::new();
        let expirations = Arc::new(MemoryExpirationScheduler::new(clock.clone()));

        let service = PasteService::new(
            config,
            Collaborators {
                pastes: pastes.clone(),
                grants: grants.clone(),
                accounts: Arc::new(accounts.clone()),
                formatter: formatter.clone() as Arc<dyn Formatter>,
                expirations: expirations.clone(),
                languages: Arc::new(LanguageRegistry::builtin()),
                clock: clock.clone(),
            },
        )
        // The default render cache capacity is non-zero.
        .unwrap_or_else(|e| panic!("fixture service: {e}"));

        Self {
            clock,
            pastes,
            grants,
            accounts,
            formatter,
            expirations,
            service,
        }
    }

    /// Move the fixture clock forward.
    pub fn advance(&self, by: Duration) {
        self.clock.advance(by);
    }

    /// Register an account.
    pub fn account(&self, name: &str) -> AccountId {
        self.accounts.add_account(format!("acct-{name}"), name)
    }

    /// Create an unencrypted paste anonymously in `session`.
    pub async fn create(&self, session: &mut MemorySession, body: &str) -> Paste {
        let mut req = Requester::anonymous(FIXTURE_SOURCE, session);
        self.service
            .create_paste(&mut req, PasteDraft::new(body.to_owned()), None)
            .await
            .unwrap_or_else(|e| panic!("fixture create: {e}"))
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// `n` independent anonymous sessions.
pub fn sessions(n: usize) -> Vec<MemorySession> {
    (0..n).map(|_| MemorySession::new()).collect()
}
