//! Expiration scheduler collaborator.
//!
//! The service never deletes expired pastes itself. It tells a scheduler
//! when a paste should go and the scheduler (a job queue, a TTL index) does
//! the rest.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use pastegate_core::{duration_millis, Clock, PasteId};

/// Schedules paste deletion.
pub trait ExpirationScheduler: Send + Sync {
    /// Expire `id` after `after`, replacing any earlier schedule.
    fn expire_object(&self, id: &PasteId, after: Duration);

    /// Drop any pending expiration for `id`.
    fn cancel_object_expiration(&self, id: &PasteId);

    /// Whether `id` has a pending expiration.
    fn object_has_expiration(&self, id: &PasteId) -> bool;
}

/// In-memory scheduler that records deadlines.
pub struct MemoryExpirationScheduler {
    clock: Arc<dyn Clock>,
    deadlines: RwLock<HashMap<PasteId, i64>>,
}

impl MemoryExpirationScheduler {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            deadlines: RwLock::new(HashMap::new()),
        }
    }

    /// Deadline (Unix ms) for `id`, if scheduled.
    pub fn deadline(&self, id: &PasteId) -> Option<i64> {
        self.deadlines
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .copied()
    }

    /// Pastes whose deadline has passed.
    pub fn due(&self) -> Vec<PasteId> {
        let now = self.clock.now_millis();
        let mut due: Vec<PasteId> = self
            .deadlines
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(_, &deadline)| deadline <= now)
            .map(|(id, _)| id.clone())
            .collect();
        due.sort();
        due
    }
}

impl ExpirationScheduler for MemoryExpirationScheduler {
    fn expire_object(&self, id: &PasteId, after: Duration) {
        let deadline = self.clock.now_millis().saturating_add(duration_millis(after));
        self.deadlines
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.clone(), deadline);
    }

    fn cancel_object_expiration(&self, id: &PasteId) {
        self.deadlines
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id);
    }

    fn object_has_expiration(&self, id: &PasteId) -> bool {
        self.deadlines
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(id)
    }
}
