//! # Pastegate Testkit
//!
//! Testing utilities for pastegate.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: a fully wired [`PasteService`](pastegate::PasteService)
//!   over in-memory collaborators and a manual clock
//! - **Formatters**: counting and failing formatter doubles
//! - **Generators**: proptest strategies for permissions, ids and drafts
//! - **Vectors**: golden tables for expiration strings and permission display
//!
//! ## Test Fixtures
//!
//! ```rust,no_run
//! use pastegate_testkit::fixtures::TestFixture;
//! use pastegate::perms::MemorySession;
//!
//! # async fn demo() {
//! let fixture = TestFixture::new();
//! let mut session = MemorySession::new();
//! let paste = fixture.create(&mut session, "hello").await;
//! fixture.advance(std::time::Duration::from_secs(60));
//! # }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use pastegate_testkit::generators::{nonempty_permission, paste_id};
//!
//! proptest! {
//!     #[test]
//!     fn grant_then_has(id in paste_id(), bits in nonempty_permission()) {
//!         // ...
//!     }
//! }
//! ```

pub mod fixtures;
pub mod formatters;
pub mod generators;
pub mod vectors;

pub use fixtures::{sessions, TestFixture, FIXTURE_EPOCH_MS, FIXTURE_SOURCE};
pub use formatters::{CountingFormatter, FailingFormatter};
pub use generators::DraftParams;
pub use vectors::{expiration_vectors, verify_expiration_vectors, ExpirationVector};
