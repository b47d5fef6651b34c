//! # Pastegate Permissions
//!
//! Who may do what to a paste, and how rights get handed on.
//!
//! ## Overview
//!
//! Rights are [`Permission`](pastegate_core::Permission) bitmasks. Where they
//! are kept depends on the requester:
//!
//! - **Account scope**: authenticated users keep rights in the external account
//!   store, reached through [`AccountService`].
//! - **Anonymous scope**: everybody else keeps a paste to mask map inside their
//!   session payload ([`AnonymousPermissions`]).
//!
//! [`ScopeResolver::resolve`] picks exactly one of the two. An authenticated
//! requester never sees rights recorded in their anonymous session.
//!
//! ## Key Types
//!
//! - [`PermissionScope`]: the resolved scope, with `has`/`grant`/`revoke`
//! - [`SessionPayload`]: the opaque session bag the web layer persists
//! - [`GrantBroker`]: mints and redeems single-use bearer grants
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use pastegate_core::{PasteId, Permission};
//! use pastegate_perms::{memory::MemoryAccountService, MemorySession, ScopeResolver};
//!
//! # async fn demo() -> pastegate_perms::Result<()> {
//! let resolver = ScopeResolver::new(Arc::new(MemoryAccountService::new()));
//! let mut session = MemorySession::new();
//! let paste = PasteId::new("ABCDE")?;
//!
//! let mut scope = resolver.resolve(&paste, None, &mut session);
//! scope.grant(Permission::ALL).await?;
//! assert!(scope.has(Permission::EDIT).await?);
//! # Ok(())
//! # }
//! ```
//!
//! ## Design Notes
//!
//! - Concurrent requests sharing one session are last-write-wins; the web
//!   layer persists whichever payload it writes last.
//! - Grant redemption removes the grant before crediting the redeemer and puts
//!   it back if the credit fails.

pub mod account;
pub mod error;
pub mod grant;
pub mod scope;
pub mod session;

pub use account::{memory, Account, AccountId, AccountScope, AccountService};
pub use error::{PermsError, Result};
pub use grant::{GrantBroker, GrantConfig, DEFAULT_GRANT_TTL};
pub use scope::{AnonymousScope, PermissionScope, ScopeResolver};
pub use session::{
    AnonymousPermissions, MemorySession, PassphraseKeyring, SessionPayload, PASSPHRASES_KEY,
    PERMISSIONS_KEY,
};
