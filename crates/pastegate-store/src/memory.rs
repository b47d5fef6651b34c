//! In-memory implementations of the storage collaborators.
//!
//! These are primarily for testing. They have the same observable semantics
//! as a real content store but keep everything in memory with no persistence.
//! "Encryption" here only gates reads on the passphrase; the body is held in
//! the clear.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use pastegate_core::{Clock, Grant, GrantId, Paste, PasteDraft, PasteId};
use rand::Rng;

use crate::error::{Result, StoreError};
use crate::traits::{GrantStore, InsertResult, PasteStore};

const ID_ALPHABET: &[u8] = b"abcdefghijkmnopqrstuvwxyz23456789";
const PLAIN_ID_LEN: usize = 5;
const ENCRYPTED_ID_LEN: usize = 8;
const MAX_ID_ATTEMPTS: usize = 32;

/// Language recorded when a draft does not name one.
pub const DEFAULT_LANGUAGE: &str = "text";

struct StoredPaste {
    paste: Paste,
    key_digest: Option<blake3::Hash>,
}

/// In-memory content store.
///
/// Thread-safe via RwLock.
pub struct MemoryPasteStore {
    pastes: RwLock<HashMap<PasteId, StoredPaste>>,
    clock: Arc<dyn Clock>,
}

impl MemoryPasteStore {
    /// Create an empty store.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            pastes: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Number of stored pastes.
    pub fn len(&self) -> usize {
        self.pastes.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn generate_id(len: usize) -> PasteId {
        let mut rng = rand::thread_rng();
        let id: String = (0..len)
            .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
            .collect();
        // The alphabet only holds URL-safe characters.
        PasteId::new(id).unwrap_or_else(|_| unreachable!())
    }
}

#[async_trait]
impl PasteStore for MemoryPasteStore {
    async fn create_paste(&self, draft: PasteDraft, passphrase: Option<&[u8]>) -> Result<Paste> {
        let now = self.clock.now_millis();
        let encrypted = passphrase.is_some();
        let id_len = if encrypted { ENCRYPTED_ID_LEN } else { PLAIN_ID_LEN };

        let mut pastes = self.pastes.write().unwrap_or_else(PoisonError::into_inner);
        let id = (0..MAX_ID_ATTEMPTS)
            .map(|_| Self::generate_id(id_len))
            .find(|id| !pastes.contains_key(id))
            .ok_or(StoreError::IdExhausted(MAX_ID_ATTEMPTS))?;

        let paste = Paste {
            id: id.clone(),
            title: draft.title,
            language: draft
                .language
                .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
            body: draft.body,
            encrypted,
            expiration: draft.expiration,
            created_at: now,
            modified_at: now,
        };
        pastes.insert(
            id,
            StoredPaste {
                paste: paste.clone(),
                key_digest: passphrase.map(blake3::hash),
            },
        );
        Ok(paste)
    }

    async fn get_paste(&self, id: &PasteId, passphrase: Option<&[u8]>) -> Result<Paste> {
        let pastes = self.pastes.read().unwrap_or_else(PoisonError::into_inner);
        let stored = pastes
            .get(id)
            .ok_or_else(|| StoreError::PasteNotFound(id.clone()))?;

        if let Some(expected) = stored.key_digest {
            match passphrase {
                None => return Err(StoreError::PasteEncrypted(id.clone())),
                // blake3::Hash equality is constant-time.
                Some(p) if blake3::hash(p) != expected => {
                    return Err(StoreError::InvalidPassphrase(id.clone()))
                }
                Some(_) => {}
            }
        }
        Ok(stored.paste.clone())
    }

    async fn update_paste(&self, mut paste: Paste) -> Result<Paste> {
        let now = self.clock.now_millis();
        let mut pastes = self.pastes.write().unwrap_or_else(PoisonError::into_inner);
        let stored = pastes
            .get_mut(&paste.id)
            .ok_or_else(|| StoreError::PasteNotFound(paste.id.clone()))?;

        paste.created_at = stored.paste.created_at;
        paste.encrypted = stored.paste.encrypted;
        paste.modified_at = now.max(stored.paste.modified_at.saturating_add(1));
        stored.paste = paste.clone();
        Ok(paste)
    }

    async fn erase_paste(&self, id: &PasteId) -> Result<()> {
        let mut pastes = self.pastes.write().unwrap_or_else(PoisonError::into_inner);
        pastes.remove(id);
        Ok(())
    }
}

/// In-memory grant store.
#[derive(Default)]
pub struct MemoryGrantStore {
    grants: RwLock<HashMap<GrantId, Grant>>,
}

impl MemoryGrantStore {
    /// Create an empty grant store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GrantStore for MemoryGrantStore {
    async fn insert_grant(&self, grant: &Grant) -> Result<InsertResult> {
        let mut grants = self.grants.write().unwrap_or_else(PoisonError::into_inner);
        if grants.contains_key(&grant.id) {
            return Ok(InsertResult::AlreadyExists);
        }
        grants.insert(grant.id, grant.clone());
        Ok(InsertResult::Inserted)
    }

    async fn get_grant(&self, id: &GrantId) -> Result<Option<Grant>> {
        let grants = self.grants.read().unwrap_or_else(PoisonError::into_inner);
        Ok(grants.get(id).cloned())
    }

    async fn take_grant(&self, id: &GrantId) -> Result<Option<Grant>> {
        let mut grants = self.grants.write().unwrap_or_else(PoisonError::into_inner);
        Ok(grants.remove(id))
    }

    async fn grants_for(&self, paste_id: &PasteId) -> Result<Vec<Grant>> {
        let grants = self.grants.read().unwrap_or_else(PoisonError::into_inner);
        Ok(grants
            .values()
            .filter(|g| &g.paste_id == paste_id)
            .cloned()
            .collect())
    }

    async fn remove_grants_for(&self, paste_id: &PasteId) -> Result<usize> {
        let mut grants = self.grants.write().unwrap_or_else(PoisonError::into_inner);
        let before = grants.len();
        grants.retain(|_, g| &g.paste_id != paste_id);
        Ok(before - grants.len())
    }

    async fn purge_expired(&self, now: i64) -> Result<usize> {
        let mut grants = self.grants.write().unwrap_or_else(PoisonError::into_inner);
        let before = grants.len();
        grants.retain(|_, g| !g.is_expired(now));
        Ok(before - grants.len())
    }
}
