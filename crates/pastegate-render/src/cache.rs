//! LRU cache of rendered pastes.
//!
//! Rendering goes through an external [`Formatter`] that can be slow, so
//! output is memoized per paste under a bounded LRU. An entry is served only
//! while it is at least as new as the paste's last modification. Encrypted
//! pastes are rendered on every request and never stored.
//!
//! Cold renders are single-flight per paste: concurrent requests for the same
//! cold paste wait for one formatter call instead of each making their own.
//! Renders of different pastes proceed in parallel.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use lru::LruCache;
use pastegate_core::{Clock, Paste, PasteId};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::error::{RenderError, Result};
use crate::formatter::Formatter;
use crate::language::LanguageRegistry;

/// Output served when the formatter fails.
pub const RENDER_FAILURE_PLACEHOLDER: &str = "There was an error rendering this paste.";

/// Default number of cached renders.
pub const DEFAULT_RENDER_CACHE_CAPACITY: usize = 1000;

/// Render cache configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderCacheConfig {
    /// Maximum number of cached renders.
    pub capacity: usize,
}

impl Default for RenderCacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_RENDER_CACHE_CAPACITY,
        }
    }
}

/// Point-in-time cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub failures: u64,
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    failures: AtomicU64,
}

struct CachedRender {
    output: Arc<str>,
    /// When the formatter was invoked (Unix ms).
    rendered_at: i64,
    /// `modified_at` of the snapshot that was rendered.
    source_modified_at: i64,
}

impl CachedRender {
    fn is_fresh_for(&self, paste: &Paste) -> bool {
        self.rendered_at >= paste.modified_at && self.source_modified_at >= paste.modified_at
    }
}

type FlightLock = Arc<tokio::sync::Mutex<()>>;

/// Memoizes formatter output per paste.
pub struct RenderCache {
    entries: RwLock<LruCache<PasteId, CachedRender>>,
    flights: Mutex<HashMap<PasteId, FlightLock>>,
    formatter: Arc<dyn Formatter>,
    languages: Arc<LanguageRegistry>,
    clock: Arc<dyn Clock>,
    counters: Counters,
}

impl RenderCache {
    /// Create a cache in front of `formatter`.
    pub fn new(
        config: RenderCacheConfig,
        formatter: Arc<dyn Formatter>,
        languages: Arc<LanguageRegistry>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let capacity = NonZeroUsize::new(config.capacity).ok_or(RenderError::ZeroCapacity)?;
        Ok(Self {
            entries: RwLock::new(LruCache::new(capacity)),
            flights: Mutex::new(HashMap::new()),
            formatter,
            languages,
            clock,
            counters: Counters::default(),
        })
    }

    /// Rendered output for `paste`, from cache when fresh.
    ///
    /// Never fails: formatter errors yield [`RENDER_FAILURE_PLACEHOLDER`] and
    /// leave nothing cached, so the next request retries.
    pub async fn render(&self, paste: &Paste) -> Arc<str> {
        if paste.encrypted {
            self.invalidate(&paste.id);
            self.counters.misses.fetch_add(1, Ordering::Relaxed);
            return self.format(paste).await.unwrap_or_else(placeholder);
        }

        if let Some(hit) = self.lookup(paste) {
            return hit;
        }

        let flight = Flight::join(self, &paste.id);
        let _turn = flight.lock.lock().await;

        // Whoever held the flight before us may have filled the cache.
        if let Some(hit) = self.lookup(paste) {
            return hit;
        }

        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        debug!(paste = %paste.id, "render cache miss");
        let rendered_at = self.clock.now_millis();
        match self.format(paste).await {
            Some(output) => {
                self.store(paste, Arc::clone(&output), rendered_at);
                output
            }
            None => {
                self.invalidate(&paste.id);
                placeholder()
            }
        }
    }

    /// Drop the cached render for `id`. Returns whether one existed.
    pub fn invalidate(&self, id: &PasteId) -> bool {
        self.write_entries().pop(id).is_some()
    }

    /// Whether a render is cached for `id`, fresh or not.
    pub fn contains(&self, id: &PasteId) -> bool {
        self.read_entries().contains(id)
    }

    /// Number of cached renders.
    pub fn len(&self) -> usize {
        self.read_entries().len()
    }

    /// Whether nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Configured capacity.
    pub fn capacity(&self) -> usize {
        self.read_entries().cap().get()
    }

    /// Snapshot of the hit/miss/eviction/failure counters.
    pub fn stats(&self) -> RenderStats {
        RenderStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            evictions: self.counters.evictions.load(Ordering::Relaxed),
            failures: self.counters.failures.load(Ordering::Relaxed),
        }
    }

    fn read_entries(&self) -> std::sync::RwLockReadGuard<'_, LruCache<PasteId, CachedRender>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_entries(&self) -> std::sync::RwLockWriteGuard<'_, LruCache<PasteId, CachedRender>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn lookup(&self, paste: &Paste) -> Option<Arc<str>> {
        let output = {
            let entries = self.read_entries();
            let entry = entries.peek(&paste.id)?;
            if !entry.is_fresh_for(paste) {
                return None;
            }
            Arc::clone(&entry.output)
        };
        self.write_entries().promote(&paste.id);
        self.counters.hits.fetch_add(1, Ordering::Relaxed);
        debug!(paste = %paste.id, "render cache hit");
        Some(output)
    }

    fn store(&self, paste: &Paste, output: Arc<str>, rendered_at: i64) {
        let entry = CachedRender {
            output,
            rendered_at,
            source_modified_at: paste.modified_at,
        };
        let evicted = self.write_entries().push(paste.id.clone(), entry);
        if let Some((evicted_id, _)) = evicted.filter(|(id, _)| id != &paste.id) {
            self.counters.evictions.fetch_add(1, Ordering::Relaxed);
            info!(paste = %evicted_id, "evicted render from cache");
        }
    }

    async fn format(&self, paste: &Paste) -> Option<Arc<str>> {
        let language = self.languages.resolve(&paste.language);
        match self.formatter.format(&paste.body_text(), language).await {
            Ok(output) => Some(Arc::from(output)),
            Err(e) => {
                self.counters.failures.fetch_add(1, Ordering::Relaxed);
                error!(paste = %paste.id, language = %language.id, error = %e, "render failed");
                None
            }
        }
    }
}

fn placeholder() -> Arc<str> {
    Arc::from(RENDER_FAILURE_PLACEHOLDER)
}

/// A caller's membership in the single-flight group for one paste.
///
/// The last member to leave removes the group's lock from the table, even
/// when the render future is dropped part-way.
struct Flight<'a> {
    cache: &'a RenderCache,
    id: PasteId,
    lock: FlightLock,
}

impl<'a> Flight<'a> {
    fn join(cache: &'a RenderCache, id: &PasteId) -> Self {
        let mut flights = cache.flights.lock().unwrap_or_else(PoisonError::into_inner);
        let lock = Arc::clone(flights.entry(id.clone()).or_default());
        Self {
            cache,
            id: id.clone(),
            lock,
        }
    }
}

impl Drop for Flight<'_> {
    fn drop(&mut self) {
        let mut flights = self.cache.flights.lock().unwrap_or_else(PoisonError::into_inner);
        // One reference in the table, one here: nobody else is waiting.
        if Arc::strong_count(&self.lock) == 2 {
            flights.remove(&self.id);
        }
    }
}
