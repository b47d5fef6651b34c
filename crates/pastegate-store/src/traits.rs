//! Storage collaborator traits.
//!
//! pastegate never owns durable content. These traits describe what it needs
//! from whatever does: a content store for pastes and a persistent store for
//! outstanding grants.

use async_trait::async_trait;
use pastegate_core::{Grant, GrantId, Paste, PasteDraft, PasteId};

use crate::error::Result;

/// Result of inserting a record keyed by a caller-chosen id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertResult {
    /// Record was inserted.
    Inserted,
    /// A record with this id already exists; nothing was written.
    AlreadyExists,
}

/// Content store: durable pastes, optionally encrypted.
///
/// Implementations own id allocation, encryption at rest and modification
/// timestamps.
#[async_trait]
pub trait PasteStore: Send + Sync {
    /// Create a paste. When `passphrase` is given the paste is stored
    /// encrypted with it.
    async fn create_paste(&self, draft: PasteDraft, passphrase: Option<&[u8]>) -> Result<Paste>;

    /// Fetch a paste.
    ///
    /// # Errors
    /// - `PasteNotFound` if no such paste exists.
    /// - `PasteEncrypted` if the paste is encrypted and `passphrase` is `None`.
    /// - `InvalidPassphrase` if the passphrase does not unlock it.
    async fn get_paste(&self, id: &PasteId, passphrase: Option<&[u8]>) -> Result<Paste>;

    /// Persist a modified snapshot and return it with a fresh `modified_at`.
    async fn update_paste(&self, paste: Paste) -> Result<Paste>;

    /// Erase a paste. Erasing a missing paste is not an error.
    async fn erase_paste(&self, id: &PasteId) -> Result<()>;
}

/// Persistent store for outstanding grants.
#[async_trait]
pub trait GrantStore: Send + Sync {
    /// Insert a grant unless its id is already taken.
    async fn insert_grant(&self, grant: &Grant) -> Result<InsertResult>;

    /// Look a grant up without consuming it.
    async fn get_grant(&self, id: &GrantId) -> Result<Option<Grant>>;

    /// Remove and return a grant in one atomic step.
    ///
    /// Of any number of concurrent callers for the same id, at most one
    /// receives `Some`.
    async fn take_grant(&self, id: &GrantId) -> Result<Option<Grant>>;

    /// Outstanding grants for a paste.
    async fn grants_for(&self, paste_id: &PasteId) -> Result<Vec<Grant>>;

    /// Remove every grant for a paste. Returns how many were removed.
    async fn remove_grants_for(&self, paste_id: &PasteId) -> Result<usize>;

    /// Remove grants whose expiry is at or before `now`.
    async fn purge_expired(&self, now: i64) -> Result<usize>;
}
