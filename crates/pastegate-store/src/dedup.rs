//! Duplicate-submission detection.
//!
//! When the same source submits the same unencrypted body twice within the
//! dedup window, the second submission resolves to the paste the first one
//! created. A reverse pointer from paste to hash lets an edit or delete drop
//! both entries so the stale body no longer matches.

use std::sync::Arc;
use std::time::Duration;

use pastegate_core::{Clock, ContentHash, PasteId};
use tracing::debug;

use crate::ephemeral::EphemeralStore;

/// Default dedup window.
pub const DEFAULT_DEDUP_TTL: Duration = Duration::from_secs(5 * 60);

/// Key for the content pointer: who submitted and what they submitted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SubmissionKey {
    source: String,
    hash: ContentHash,
}

/// Forward and reverse dedup pointers.
pub struct ContentDedup {
    by_content: EphemeralStore<SubmissionKey, PasteId>,
    by_paste: EphemeralStore<PasteId, SubmissionKey>,
    ttl: Duration,
}

impl ContentDedup {
    /// Create dedup bookkeeping with the given window.
    pub fn new(clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            by_content: EphemeralStore::new(Arc::clone(&clock)),
            by_paste: EphemeralStore::new(clock),
            ttl,
        }
    }

    /// Find a paste recently created by `source` with exactly this body.
    pub fn lookup(&self, source: &str, body: &[u8]) -> Option<PasteId> {
        let key = SubmissionKey {
            source: source.to_string(),
            hash: ContentHash::of(body),
        };
        let hit = self.by_content.get(&key);
        if let Some(ref paste_id) = hit {
            debug!(%paste_id, "dedup hit");
        }
        hit
    }

    /// Record that `source` created `paste_id` with this body.
    pub fn remember(&self, source: &str, body: &[u8], paste_id: &PasteId) {
        let key = SubmissionKey {
            source: source.to_string(),
            hash: ContentHash::of(body),
        };
        self.by_content.put(key.clone(), paste_id.clone(), self.ttl);
        self.by_paste.put(paste_id.clone(), key, self.ttl);
    }

    /// Drop both pointers for `paste_id`. Returns whether anything was live.
    pub fn forget(&self, paste_id: &PasteId) -> bool {
        match self.by_paste.get(paste_id) {
            Some(key) => {
                self.by_content.delete(&key);
                self.by_paste.delete(paste_id);
                true
            }
            None => false,
        }
    }
}
