//! Passphrase attempt throttling.
//!
//! Each (source, paste) pair gets a counter in an [`EphemeralStore`]. The
//! counter lives for `window` after the first attempt. An attempt is counted
//! before its passphrase is compared, so concurrent guesses cannot all slip
//! past the check. Once `max_failures` attempts accumulate, the counter is
//! renewed for `cooldown`; every refused attempt renews it again.
//!
//! Counters are `AtomicU32`s shared through the store, and the counter itself
//! is created with [`EphemeralStore::get_or_insert_with`], so concurrent
//! attempts are never lost. A successful attempt clears the counter.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use pastegate_core::{Clock, PasteId};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::ephemeral::EphemeralStore;

/// Throttle tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrottleConfig {
    /// Attempts allowed before further ones are refused.
    pub max_failures: u32,
    /// How long an attempt counter lives before resetting.
    pub window: Duration,
    /// How long attempts are refused once the limit is hit.
    pub cooldown: Duration,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            max_failures: 5,
            window: Duration::from_secs(60),
            cooldown: Duration::from_secs(5 * 60),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ThrottleKey {
    source: String,
    paste_id: PasteId,
}

impl ThrottleKey {
    fn new(source: &str, paste_id: &PasteId) -> Self {
        Self {
            source: source.to_string(),
            paste_id: paste_id.clone(),
        }
    }
}

/// Per source-and-paste failure counters.
pub struct AuthThrottle {
    counters: EphemeralStore<ThrottleKey, Arc<AtomicU32>>,
    config: ThrottleConfig,
}

impl AuthThrottle {
    /// Create a throttle.
    pub fn new(clock: Arc<dyn Clock>, config: ThrottleConfig) -> Self {
        Self {
            counters: EphemeralStore::new(clock),
            config,
        }
    }

    /// Count an attempt by `source` on `paste_id`.
    ///
    /// Returns `false` when the attempt must be refused without comparing
    /// the passphrase.
    pub fn try_begin_attempt(&self, source: &str, paste_id: &PasteId) -> bool {
        let key = ThrottleKey::new(source, paste_id);
        let counter = self
            .counters
            .get_or_insert_with(key.clone(), self.config.window, || Arc::new(AtomicU32::new(0)));

        let attempts = counter.fetch_add(1, Ordering::SeqCst).saturating_add(1);
        if attempts >= self.config.max_failures {
            self.counters.put(key, counter, self.config.cooldown);
        }
        if attempts > self.config.max_failures {
            warn!(%paste_id, source, attempts, "auth throttle engaged");
            return false;
        }
        true
    }

    /// Whether the next attempt by `source` on `paste_id` would be refused.
    pub fn is_throttled(&self, source: &str, paste_id: &PasteId) -> bool {
        self.attempts(source, paste_id) >= self.config.max_failures
    }

    /// Attempts counted for `source` on `paste_id` since the last reset.
    pub fn attempts(&self, source: &str, paste_id: &PasteId) -> u32 {
        self.counters
            .get(&ThrottleKey::new(source, paste_id))
            .map_or(0, |c| c.load(Ordering::SeqCst))
    }

    /// Forget all attempts by `source` on `paste_id`.
    pub fn reset(&self, source: &str, paste_id: &PasteId) {
        self.counters.delete(&ThrottleKey::new(source, paste_id));
    }
}
