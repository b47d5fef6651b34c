//! # Pastegate Core
//!
//! Pure primitives for pastegate: capability bits, paste records, grants,
//! content validation and time.
//!
//! This crate contains no I/O, no storage, no networking. Every type here is
//! shared by the store, permission and render layers.
//!
//! ## Key Types
//!
//! - [`Permission`] - Bitmask over the named rights View, Edit, Delete, Grant
//! - [`PasteId`] - Identity of a piece of published content
//! - [`Paste`] - A snapshot of a paste as returned by the content store
//! - [`Grant`] - A single-use bearer capability for a paste
//! - [`Clock`] - Source of Unix-millisecond timestamps

pub mod clock;
pub mod error;
pub mod grant;
pub mod paste;
pub mod permission;
pub mod types;
pub mod validation;

pub use clock::{duration_millis, now_millis, Clock, ManualClock, SystemClock};
pub use error::{CoreError, Result};
pub use grant::Grant;
pub use paste::{Expiration, Paste, PasteDraft, PasteDocument};
pub use permission::{Permission, PermissionClass};
pub use types::{ContentHash, GrantId, PasteId};
pub use validation::{validate_body, ByteSize, MAX_PASTE_LENGTH};
