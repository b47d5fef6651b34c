//! Grant delegation.
//!
//! A holder of `GRANT` on a paste can mint a bearer token that hands a fixed
//! subset of their own rights to whoever presents it. Tokens are single use:
//! redemption removes the grant from the store before crediting the
//! redeemer, so concurrent redeemers race on the store and exactly one wins.

use std::sync::Arc;
use std::time::Duration;

use pastegate_core::{Clock, Grant, GrantId, PasteId, Permission};
use pastegate_store::{GrantStore, InsertResult};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::account::AccountId;
use crate::error::{PermsError, Result};
use crate::scope::{PermissionScope, ScopeResolver};
use crate::session::SessionPayload;

/// Default grant lifetime.
pub const DEFAULT_GRANT_TTL: Duration = Duration::from_secs(7 * 24 * 3600);

/// Grant minting policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrantConfig {
    /// How long an unredeemed grant stays valid. `None` keeps it forever.
    pub ttl: Option<Duration>,

    /// How many ids to try before giving up on a collision streak.
    pub max_mint_attempts: usize,
}

impl Default for GrantConfig {
    fn default() -> Self {
        Self {
            ttl: Some(DEFAULT_GRANT_TTL),
            max_mint_attempts: 8,
        }
    }
}

/// Mints and redeems grants.
pub struct GrantBroker {
    store: Arc<dyn GrantStore>,
    clock: Arc<dyn Clock>,
    config: GrantConfig,
}

impl GrantBroker {
    /// Create a broker over `store`.
    pub fn new(store: Arc<dyn GrantStore>, clock: Arc<dyn Clock>, config: GrantConfig) -> Self {
        Self {
            store,
            clock,
            config,
        }
    }

    /// Mint a grant conferring `bits` on the paste `creator` is scoped to.
    ///
    /// The creator must hold `GRANT` and every bit being handed out.
    pub async fn create(&self, creator: &PermissionScope<'_>, bits: Permission) -> Result<Grant> {
        let paste_id = creator.paste_id();
        if bits.is_empty() {
            return Err(PermsError::InvalidGrant("grant confers no rights".into()));
        }
        if !creator.has(Permission::GRANT).await? {
            return Err(PermsError::PermissionDenied(format!(
                "no grant right on {}",
                paste_id
            )));
        }
        if !creator.has(bits).await? {
            return Err(PermsError::PermissionDenied(format!(
                "cannot delegate {} on {}",
                bits, paste_id
            )));
        }

        let now = self.clock.now_millis();
        for _ in 0..self.config.max_mint_attempts {
            let grant = Grant::new(paste_id.clone(), bits, now, self.config.ttl);
            match self.store.insert_grant(&grant).await? {
                InsertResult::Inserted => {
                    info!(paste = %paste_id, grant = %grant.id, permission = %bits, "minted grant");
                    return Ok(grant);
                }
                InsertResult::AlreadyExists => {
                    warn!(paste = %paste_id, "grant id collision, retrying");
                }
            }
        }
        Err(PermsError::GrantIdExhausted(self.config.max_mint_attempts))
    }

    /// Redeem grant `id` into the requester's scope.
    ///
    /// Unknown, used and expired tokens all fail with
    /// [`PermsError::RedemptionDenied`]. If crediting the scope fails the grant
    /// is put back and the error returned, so the token stays usable.
    pub async fn redeem(
        &self,
        id: &GrantId,
        resolver: &ScopeResolver,
        account: Option<&AccountId>,
        session: &mut dyn SessionPayload,
    ) -> Result<Grant> {
        let Some(grant) = self.store.take_grant(id).await? else {
            warn!(grant = %id, "rejected grant redemption");
            return Err(PermsError::RedemptionDenied);
        };
        if grant.is_expired(self.clock.now_millis()) {
            warn!(grant = %id, paste = %grant.paste_id, "rejected expired grant");
            return Err(PermsError::RedemptionDenied);
        }

        let mut scope = resolver.resolve(&grant.paste_id, account, session);
        if let Err(e) = scope.grant(grant.permission).await {
            warn!(grant = %id, error = %e, "crediting grant failed, reinstating");
            self.store.insert_grant(&grant).await?;
            return Err(e);
        }

        info!(paste = %grant.paste_id, grant = %id, permission = %grant.permission, "redeemed grant");
        Ok(grant)
    }

    /// Outstanding grants for a paste.
    pub async fn outstanding(&self, paste_id: &PasteId) -> Result<Vec<Grant>> {
        Ok(self.store.grants_for(paste_id).await?)
    }

    /// Drop every grant for a paste.
    pub async fn revoke_all(&self, paste_id: &PasteId) -> Result<usize> {
        Ok(self.store.remove_grants_for(paste_id).await?)
    }

    /// Reclaim expired grants.
    pub async fn purge_expired(&self) -> Result<usize> {
        Ok(self.store.purge_expired(self.clock.now_millis()).await?)
    }
}
