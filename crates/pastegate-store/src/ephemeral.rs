//! TTL-bounded key/value cache.
//!
//! [`EphemeralStore`] is the shared substrate for short-lived bookkeeping:
//! duplicate-content pointers, their reverse pointers, and auth throttle
//! counters. Entries become invisible the moment their expiry passes, whether
//! or not a sweep has physically removed them yet.
//!
//! The store is generic over its key and value types. Each feature constructs
//! its own instance with its own key type, which gives every feature a private
//! namespace enforced by the type system.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use pastegate_core::{duration_millis, Clock};
use tracing::trace;

/// Number of writes between opportunistic sweeps of expired entries.
pub const SWEEP_INTERVAL: u64 = 1024;

struct Entry<V> {
    value: V,
    expires_at: i64,
}

impl<V> Entry<V> {
    fn is_live(&self, now: i64) -> bool {
        now < self.expires_at
    }
}

/// A concurrency-safe map whose entries expire.
///
/// Reads take a shared lock; writes take an exclusive lock. Values are cloned
/// out, so readers never observe a partially written entry.
pub struct EphemeralStore<K, V> {
    entries: RwLock<HashMap<K, Entry<V>>>,
    clock: Arc<dyn Clock>,
    writes: AtomicU64,
}

impl<K, V> EphemeralStore<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    /// Create an empty store driven by `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
            writes: AtomicU64::new(0),
        }
    }

    /// Store `value` under `key`, replacing any prior entry.
    ///
    /// The entry becomes unreadable once `ttl` has elapsed from this call.
    pub fn put(&self, key: K, value: V, ttl: Duration) {
        let now = self.clock.now_millis();
        let expires_at = now.saturating_add(duration_millis(ttl));
        {
            let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
            entries.insert(key, Entry { value, expires_at });
        }
        self.after_write(now);
    }

    /// Fetch the live value for `key`.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now_millis();
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(key)
            .filter(|e| e.is_live(now))
            .map(|e| e.value.clone())
    }

    /// Remove `key`. Returns whether a live entry was removed.
    ///
    /// Deleting an absent or expired key is a no-op.
    pub fn delete(&self, key: &K) -> bool {
        let now = self.clock.now_millis();
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key).map_or(false, |e| e.is_live(now))
    }

    /// Return the live value for `key`, inserting `make()` with `ttl` if there
    /// is none.
    ///
    /// The lookup and the insert happen under one exclusive lock, so racing
    /// callers all receive the same value.
    pub fn get_or_insert_with<F>(&self, key: K, ttl: Duration, make: F) -> V
    where
        F: FnOnce() -> V,
    {
        let now = self.clock.now_millis();
        let value = {
            let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
            match entries.get(&key) {
                Some(entry) if entry.is_live(now) => return entry.value.clone(),
                _ => {
                    let value = make();
                    entries.insert(
                        key,
                        Entry {
                            value: value.clone(),
                            expires_at: now.saturating_add(duration_millis(ttl)),
                        },
                    );
                    value
                }
            }
        };
        self.after_write(now);
        value
    }

    /// Physically remove every expired entry. Returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now_millis();
        self.purge_at(now)
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        let now = self.clock.now_millis();
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.values().filter(|e| e.is_live(now)).count()
    }

    /// Whether there are no live entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn after_write(&self, now: i64) {
        let writes = self.writes.fetch_add(1, Ordering::Relaxed) + 1;
        if writes % SWEEP_INTERVAL == 0 {
            let dropped = self.purge_at(now);
            trace!(dropped, "ephemeral store sweep");
        }
    }

    fn purge_at(&self, now: i64) -> usize {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|_, e| e.is_live(now));
        before - entries.len()
    }
}
