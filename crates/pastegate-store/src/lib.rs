//! # Pastegate Store
//!
//! Short-lived bookkeeping and storage collaborators for pastegate.
//!
//! ## Overview
//!
//! Two very different kinds of state live here:
//!
//! - **Ephemeral state**: [`EphemeralStore`] is a TTL-bounded key/value cache.
//!   It backs [`ContentDedup`] (hash to paste pointers and their reverse
//!   pointers) and [`AuthThrottle`] (failed-passphrase counters). Each feature
//!   owns its own typed store instance, so keys from different features can
//!   never collide.
//! - **Persistent collaborators**: [`PasteStore`] and [`GrantStore`] are the
//!   async traits the rest of the system talks to. [`MemoryPasteStore`] and
//!   [`MemoryGrantStore`] serve tests; [`SqliteGrantStore`] keeps grants on disk.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use pastegate_core::SystemClock;
//! use pastegate_store::EphemeralStore;
//!
//! let store: EphemeralStore<String, u32> = EphemeralStore::new(Arc::new(SystemClock));
//! store.put("answer".to_string(), 42, Duration::from_secs(60));
//! assert_eq!(store.get(&"answer".to_string()), Some(42));
//! ```
//!
//! ## Design Notes
//!
//! - **Lazy expiry**: expired entries are invisible to readers immediately;
//!   physical removal happens on periodic sweeps.
//! - **Single-use grants**: [`GrantStore::take_grant`] removes and returns a
//!   grant in one step, so concurrent redeemers cannot both observe it.

pub mod dedup;
pub mod ephemeral;
pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod throttle;
pub mod traits;

pub use dedup::ContentDedup;
pub use ephemeral::EphemeralStore;
pub use error::{Result, StoreError};
pub use memory::{MemoryGrantStore, MemoryPasteStore};
pub use sqlite::SqliteGrantStore;
pub use throttle::{AuthThrottle, ThrottleConfig};
pub use traits::{GrantStore, InsertResult, PasteStore};
