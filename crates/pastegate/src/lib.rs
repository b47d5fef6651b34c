//! # Pastegate
//!
//! The permission and caching core of a paste-publishing service.
//!
//! ## Overview
//!
//! Pastegate decides who may do what to a paste and keeps the expensive parts
//! of serving one cheap:
//!
//! - **Permission scopes**: rights are bitmasks kept either in the requester's
//!   account (authenticated) or in their session (anonymous). The account
//!   scope always wins.
//! - **Grants**: single-use bearer tokens that hand a subset of one's rights
//!   on a paste to whoever redeems them.
//! - **Ephemeral bookkeeping**: TTL-bounded dedup of repeat submissions and
//!   throttling of failed passphrase attempts.
//! - **Render cache**: LRU memoization of formatted output, invalidated by
//!   modification time and never holding encrypted content.
//!
//! Content storage, accounts, formatting and expiration scheduling are
//! collaborators behind traits; pastegate calls them but does not implement
//! them beyond in-memory versions for tests and embedding.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use pastegate::{Collaborators, PasteService, Requester, ServiceConfig};
//! use pastegate::core::{PasteDraft, Permission, SystemClock};
//! use pastegate::expiration::MemoryExpirationScheduler;
//! use pastegate::perms::{memory::MemoryAccountService, MemorySession};
//! use pastegate::render::{LanguageRegistry, PlainTextFormatter};
//! use pastegate::store::{MemoryGrantStore, MemoryPasteStore};
//!
//! async fn example() -> pastegate::Result<()> {
//!     let clock = Arc::new(SystemClock);
//!     let service = PasteService::new(
//!         ServiceConfig::default(),
//!         Collaborators {
//!             pastes: Arc::new(MemoryPasteStore::new(clock.clone())),
//!             grants: Arc::new(MemoryGrantStore::new()),
//!             accounts: Arc::new(MemoryAccountService::new()),
//!             formatter: Arc::new(PlainTextFormatter),
//!             expirations: Arc::new(MemoryExpirationScheduler::new(clock.clone())),
//!             languages: Arc::new(LanguageRegistry::builtin()),
//!             clock,
//!         },
//!     )?;
//!
//!     let mut session = MemorySession::new();
//!     let mut req = Requester::anonymous("203.0.113.7", &mut session);
//!     let paste = service
//!         .create_paste(&mut req, PasteDraft::new("fn main() {}").language("rust"), None)
//!         .await?;
//!     assert!(service.check(&mut req, &paste.id, Permission::ALL).await?);
//!
//!     let html = service.render_paste(&mut req, &paste.id).await?;
//!     println!("{html}");
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `pastegate::core` - ids, permissions, pastes, grants, clocks
//! - `pastegate::store` - ephemeral store, dedup, throttle, content/grant stores
//! - `pastegate::perms` - scopes, sessions, accounts, grant broker
//! - `pastegate::render` - formatter seam, language registry, render cache

pub mod config;
pub mod error;
pub mod expiration;
pub mod service;

// Re-export component crates
pub use pastegate_core as core;
pub use pastegate_perms as perms;
pub use pastegate_render as render;
pub use pastegate_store as store;

// Re-export main types for convenience
pub use config::{ServiceConfig, MAX_EXPIRATION};
pub use error::{Action, Result, ServiceError};
pub use expiration::{ExpirationScheduler, MemoryExpirationScheduler};
pub use service::{Collaborators, PasteService, Requester};

// Re-export commonly used core types
pub use pastegate_core::{
    Expiration, Grant, GrantId, Paste, PasteDocument, PasteDraft, PasteId, Permission,
};
