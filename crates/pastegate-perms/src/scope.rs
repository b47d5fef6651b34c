//! Permission scope resolution.
//!
//! A requester's rights on a paste live in exactly one place. Authenticated
//! requesters use their account scope; anonymous requesters use the map in
//! their session. Resolution is precedence, not union: once an account is
//! present, whatever the session says about the paste is ignored.

use std::sync::Arc;

use pastegate_core::{PasteId, Permission, PermissionClass};
use tracing::debug;

use crate::account::{AccountId, AccountScope, AccountService};
use crate::error::Result;
use crate::session::{AnonymousPermissions, SessionPayload};

/// Session-backed rights on one paste.
///
/// Every mutation is written back to the session before it returns, so a
/// read-modify-persist cycle never leaves the payload half-updated.
pub struct AnonymousScope<'s> {
    paste_id: PasteId,
    session: &'s mut dyn SessionPayload,
}

impl<'s> AnonymousScope<'s> {
    /// Scope over `paste_id` in `session`.
    pub fn new(paste_id: PasteId, session: &'s mut dyn SessionPayload) -> Self {
        Self { paste_id, session }
    }

    /// Current mask for the paste.
    pub fn permissions(&self) -> Permission {
        AnonymousPermissions::load(&*self.session).get(&self.paste_id)
    }

    fn has(&self, bits: Permission) -> bool {
        self.permissions().contains(bits)
    }

    fn grant(&mut self, bits: Permission) -> Result<()> {
        let mut map = AnonymousPermissions::load(&*self.session);
        map.grant(&self.paste_id, bits);
        map.store(&mut *self.session)
    }

    fn revoke(&mut self, bits: Permission) -> Result<()> {
        let mut map = AnonymousPermissions::load(&*self.session);
        map.revoke(&self.paste_id, bits);
        map.store(&mut *self.session)
    }
}

/// Where a requester's rights on one paste are kept.
pub enum PermissionScope<'s> {
    /// Persistent rights of an authenticated account.
    Account {
        paste_id: PasteId,
        scope: Box<dyn AccountScope>,
    },
    /// Rights held in an anonymous session.
    Anonymous(AnonymousScope<'s>),
}

impl<'s> PermissionScope<'s> {
    /// The paste this scope is about.
    pub fn paste_id(&self) -> &PasteId {
        match self {
            PermissionScope::Account { paste_id, .. } => paste_id,
            PermissionScope::Anonymous(anon) => &anon.paste_id,
        }
    }

    /// Whether this is an account-backed scope.
    pub fn is_account(&self) -> bool {
        matches!(self, PermissionScope::Account { .. })
    }

    /// Whether every bit in `bits` is held.
    pub async fn has(&self, bits: Permission) -> Result<bool> {
        match self {
            PermissionScope::Account { scope, .. } => scope.has(bits).await,
            PermissionScope::Anonymous(anon) => Ok(anon.has(bits)),
        }
    }

    /// Add `bits`.
    pub async fn grant(&mut self, bits: Permission) -> Result<()> {
        match self {
            PermissionScope::Account { scope, .. } => scope.grant(bits).await,
            PermissionScope::Anonymous(anon) => anon.grant(bits),
        }
    }

    /// Remove `bits`.
    pub async fn revoke(&mut self, bits: Permission) -> Result<()> {
        match self {
            PermissionScope::Account { scope, .. } => scope.revoke(bits).await,
            PermissionScope::Anonymous(anon) => anon.revoke(bits),
        }
    }
}

/// Picks the backing store for (paste, requester).
#[derive(Clone)]
pub struct ScopeResolver {
    accounts: Arc<dyn AccountService>,
}

impl ScopeResolver {
    /// Resolver over `accounts`.
    pub fn new(accounts: Arc<dyn AccountService>) -> Self {
        Self { accounts }
    }

    /// The account service this resolver delegates to.
    pub fn accounts(&self) -> &Arc<dyn AccountService> {
        &self.accounts
    }

    /// Resolve the scope for `paste_id`.
    ///
    /// With an account, only the account scope is consulted. Otherwise the
    /// session's anonymous map is used.
    pub fn resolve<'s>(
        &self,
        paste_id: &PasteId,
        account: Option<&AccountId>,
        session: &'s mut dyn SessionPayload,
    ) -> PermissionScope<'s> {
        match account {
            Some(account) => {
                debug!(paste = %paste_id, account = %account, "resolved account scope");
                PermissionScope::Account {
                    paste_id: paste_id.clone(),
                    scope: self.accounts.scope(account, PermissionClass::Paste, paste_id),
                }
            }
            None => {
                debug!(paste = %paste_id, "resolved anonymous scope");
                PermissionScope::Anonymous(AnonymousScope::new(paste_id.clone(), session))
            }
        }
    }
}
