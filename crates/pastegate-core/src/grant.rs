//! Grant records.
//!
//! A grant is a transferable, single-use bearer capability: whoever presents
//! its id receives `permission` on `paste_id`. Grants are not owned by any
//! account; the content store keeps them until they are redeemed or expire.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::clock::duration_millis;
use crate::permission::Permission;
use crate::types::{GrantId, PasteId};

/// An outstanding grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    /// Unguessable bearer token.
    pub id: GrantId,

    /// The paste the grant confers rights on.
    pub paste_id: PasteId,

    /// Bits credited to the redeemer.
    pub permission: Permission,

    /// When the grant was minted (Unix ms).
    pub created_at: i64,

    /// When the grant stops being redeemable (Unix ms).
    pub expires_at: Option<i64>,
}

impl Grant {
    /// Mint a grant with a fresh random id.
    pub fn new(paste_id: PasteId, permission: Permission, now: i64, ttl: Option<Duration>) -> Self {
        Self {
            id: GrantId::generate(),
            paste_id,
            permission,
            created_at: now,
            expires_at: ttl.map(|ttl| now.saturating_add(duration_millis(ttl))),
        }
    }

    /// Replace the id, keeping everything else.
    pub fn with_id(mut self, id: GrantId) -> Self {
        self.id = id;
        self
    }

    /// Check whether the grant has expired at `now`.
    pub fn is_expired(&self, now: i64) -> bool {
        matches!(self.expires_at, Some(expires) if now >= expires)
    }
}
