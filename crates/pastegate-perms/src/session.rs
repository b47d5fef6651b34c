//! Session payload access.
//!
//! The session itself (cookie encoding, signing, persistence) belongs to the
//! web layer. pastegate only sees an opaque key/value bag and owns two keys in
//! it: the anonymous paste permission map and the remembered passphrases for
//! encrypted pastes. Both are CBOR-encoded maps keyed by paste id.

use std::collections::{BTreeMap, HashMap};

use pastegate_core::{PasteId, Permission};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::error::{PermsError, Result};

/// Session key holding the anonymous paste to permission map.
pub const PERMISSIONS_KEY: &str = "paste_permissions";

/// Session key holding remembered passphrases for encrypted pastes.
pub const PASSPHRASES_KEY: &str = "paste_passphrases";

/// An opaque per-requester key/value bag.
pub trait SessionPayload: Send + Sync {
    /// Raw value stored under `key`.
    fn get(&self, key: &str) -> Option<Vec<u8>>;

    /// Store `value` under `key`, replacing anything there.
    fn set(&mut self, key: &str, value: Vec<u8>);

    /// Drop `key`.
    fn remove(&mut self, key: &str);
}

/// A session payload held in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemorySession {
    values: HashMap<String, Vec<u8>>,
}

impl MemorySession {
    /// An empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the session holds any keys.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Whether `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }
}

impl SessionPayload for MemorySession {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Vec<u8>) {
        self.values.insert(key.to_string(), value);
    }

    fn remove(&mut self, key: &str) {
        self.values.remove(key);
    }
}

/// Read a paste-keyed map from the session.
///
/// A missing key yields an empty map. So does an undecodable value: a stale or
/// tampered cookie must not lock the requester out of the site.
fn load_map<V: DeserializeOwned>(session: &dyn SessionPayload, key: &str) -> BTreeMap<PasteId, V> {
    let Some(raw) = session.get(key) else {
        return BTreeMap::new();
    };
    match ciborium::from_reader(raw.as_slice()) {
        Ok(map) => map,
        Err(e) => {
            warn!(key, error = %e, "discarding undecodable session value");
            BTreeMap::new()
        }
    }
}

/// Write a paste-keyed map back, dropping the key when the map is empty.
fn store_map<V: Serialize>(
    session: &mut dyn SessionPayload,
    key: &str,
    map: &BTreeMap<PasteId, V>,
) -> Result<()> {
    if map.is_empty() {
        session.remove(key);
        return Ok(());
    }
    let mut buf = Vec::new();
    ciborium::into_writer(map, &mut buf)
        .map_err(|e| PermsError::SerializationError(e.to_string()))?;
    session.set(key, buf);
    Ok(())
}

/// The anonymous permission map held in a session.
///
/// Never contains a zero mask: clearing the last bit for a paste removes
/// its entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnonymousPermissions {
    entries: BTreeMap<PasteId, Permission>,
}

impl AnonymousPermissions {
    /// Decode the map from `session`.
    pub fn load(session: &dyn SessionPayload) -> Self {
        let mut entries: BTreeMap<PasteId, Permission> = load_map(session, PERMISSIONS_KEY);
        entries.retain(|_, p| !p.is_empty());
        Self { entries }
    }

    /// Encode the map into `session`.
    pub fn store(&self, session: &mut dyn SessionPayload) -> Result<()> {
        store_map(session, PERMISSIONS_KEY, &self.entries)
    }

    /// Bits held for `paste_id`.
    pub fn get(&self, paste_id: &PasteId) -> Permission {
        self.entries.get(paste_id).copied().unwrap_or_default()
    }

    /// OR `bits` into the mask for `paste_id`.
    pub fn grant(&mut self, paste_id: &PasteId, bits: Permission) {
        if bits.is_empty() {
            return;
        }
        *self.entries.entry(paste_id.clone()).or_default() |= bits;
    }

    /// Clear `bits` for `paste_id`, dropping the entry once nothing is left.
    pub fn revoke(&mut self, paste_id: &PasteId, bits: Permission) {
        if let Some(mask) = self.entries.get_mut(paste_id) {
            *mask = *mask - bits;
            if mask.is_empty() {
                self.entries.remove(paste_id);
            }
        }
    }

    /// Whether an entry exists for `paste_id`.
    pub fn contains(&self, paste_id: &PasteId) -> bool {
        self.entries.contains_key(paste_id)
    }

    /// Number of pastes with a non-zero mask.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no paste has any bits.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Passphrases the requester has proven for encrypted pastes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassphraseKeyring {
    entries: BTreeMap<PasteId, String>,
}

impl PassphraseKeyring {
    /// Decode the keyring from `session`.
    pub fn load(session: &dyn SessionPayload) -> Self {
        Self {
            entries: load_map(session, PASSPHRASES_KEY),
        }
    }

    /// Encode the keyring into `session`.
    pub fn store(&self, session: &mut dyn SessionPayload) -> Result<()> {
        store_map(session, PASSPHRASES_KEY, &self.entries)
    }

    /// Remembered passphrase for `paste_id`.
    pub fn get(&self, paste_id: &PasteId) -> Option<&str> {
        self.entries.get(paste_id).map(String::as_str)
    }

    /// Remember `passphrase` for `paste_id`.
    pub fn insert(&mut self, paste_id: &PasteId, passphrase: impl Into<String>) {
        self.entries.insert(paste_id.clone(), passphrase.into());
    }

    /// Forget the passphrase for `paste_id`.
    pub fn remove(&mut self, paste_id: &PasteId) -> bool {
        self.entries.remove(paste_id).is_some()
    }
}
