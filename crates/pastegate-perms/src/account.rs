//! Account service collaborator.
//!
//! Authenticated users keep their paste rights in an external account store.
//! pastegate asks the [`AccountService`] for a per-user, per-paste
//! [`AccountScope`] and talks to that directly; failures from the store
//! surface as [`PermsError::AccountBackend`](crate::PermsError::AccountBackend).

use std::fmt;

use async_trait::async_trait;
use pastegate_core::{PasteId, Permission, PermissionClass};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Identity of an authenticated account.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    /// Wrap an account id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({})", self.0)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A user known to the account service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
}

/// Persistent rights one account holds on one paste.
#[async_trait]
pub trait AccountScope: Send + Sync {
    /// Whether every bit in `bits` is held.
    async fn has(&self, bits: Permission) -> Result<bool>;

    /// Add `bits`.
    async fn grant(&self, bits: Permission) -> Result<()>;

    /// Remove `bits`. Removing the last bit drops the record.
    async fn revoke(&self, bits: Permission) -> Result<()>;
}

/// The external account store.
#[async_trait]
pub trait AccountService: Send + Sync {
    /// Look a user up by login name.
    async fn user_named(&self, name: &str) -> Result<Option<Account>>;

    /// Look a user up by id.
    async fn user_by_id(&self, id: &AccountId) -> Result<Option<Account>>;

    /// A handle on `account`'s rights over one resource.
    fn scope(
        &self,
        account: &AccountId,
        class: PermissionClass,
        paste_id: &PasteId,
    ) -> Box<dyn AccountScope>;
}

/// In-memory account service for testing.
pub mod memory {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, PoisonError, RwLock};

    use super::*;
    use crate::error::PermsError;

    type ScopeKey = (AccountId, PermissionClass, PasteId);

    #[derive(Default)]
    struct Shared {
        accounts: RwLock<HashMap<AccountId, Account>>,
        rights: RwLock<HashMap<ScopeKey, Permission>>,
        unavailable: AtomicBool,
    }

    impl Shared {
        fn check_available(&self) -> Result<()> {
            if self.unavailable.load(Ordering::SeqCst) {
                return Err(PermsError::AccountBackend("account store unreachable".into()));
            }
            Ok(())
        }
    }

    /// Account service backed by in-process maps.
    ///
    /// [`MemoryAccountService::set_unavailable`] makes every call fail, to
    /// exercise backend-failure paths.
    #[derive(Clone, Default)]
    pub struct MemoryAccountService {
        shared: Arc<Shared>,
    }

    impl MemoryAccountService {
        /// Create an empty service.
        pub fn new() -> Self {
            Self::default()
        }

        /// Register an account.
        pub fn add_account(&self, id: impl Into<String>, name: impl Into<String>) -> AccountId {
            let id = AccountId::new(id);
            let account = Account {
                id: id.clone(),
                name: name.into(),
            };
            self.shared
                .accounts
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(id.clone(), account);
            id
        }

        /// Toggle simulated outage.
        pub fn set_unavailable(&self, unavailable: bool) {
            self.shared.unavailable.store(unavailable, Ordering::SeqCst);
        }

        /// Raw bits recorded for `account` on `paste_id`.
        pub fn rights(&self, account: &AccountId, paste_id: &PasteId) -> Permission {
            let key = (account.clone(), PermissionClass::Paste, paste_id.clone());
            self.shared
                .rights
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .get(&key)
                .copied()
                .unwrap_or_default()
        }
    }

    #[async_trait]
    impl AccountService for MemoryAccountService {
        async fn user_named(&self, name: &str) -> Result<Option<Account>> {
            self.shared.check_available()?;
            let accounts = self.shared.accounts.read().unwrap_or_else(PoisonError::into_inner);
            Ok(accounts.values().find(|a| a.name == name).cloned())
        }

        async fn user_by_id(&self, id: &AccountId) -> Result<Option<Account>> {
            self.shared.check_available()?;
            let accounts = self.shared.accounts.read().unwrap_or_else(PoisonError::into_inner);
            Ok(accounts.get(id).cloned())
        }

        fn scope(
            &self,
            account: &AccountId,
            class: PermissionClass,
            paste_id: &PasteId,
        ) -> Box<dyn AccountScope> {
            Box::new(MemoryAccountScope {
                shared: Arc::clone(&self.shared),
                key: (account.clone(), class, paste_id.clone()),
            })
        }
    }

    struct MemoryAccountScope {
        shared: Arc<Shared>,
        key: ScopeKey,
    }

    #[async_trait]
    impl AccountScope for MemoryAccountScope {
        async fn has(&self, bits: Permission) -> Result<bool> {
            self.shared.check_available()?;
            let rights = self.shared.rights.read().unwrap_or_else(PoisonError::into_inner);
            Ok(rights.get(&self.key).copied().unwrap_or_default().contains(bits))
        }

        async fn grant(&self, bits: Permission) -> Result<()> {
            self.shared.check_available()?;
            if bits.is_empty() {
                return Ok(());
            }
            let mut rights = self.shared.rights.write().unwrap_or_else(PoisonError::into_inner);
            *rights.entry(self.key.clone()).or_default() |= bits;
            Ok(())
        }

        async fn revoke(&self, bits: Permission) -> Result<()> {
            self.shared.check_available()?;
            let mut rights = self.shared.rights.write().unwrap_or_else(PoisonError::into_inner);
            if let Some(mask) = rights.get_mut(&self.key) {
                *mask = *mask - bits;
                if mask.is_empty() {
                    rights.remove(&self.key);
                }
            }
            Ok(())
        }
    }
}
