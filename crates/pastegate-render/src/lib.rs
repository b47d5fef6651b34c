//! # Pastegate Render
//!
//! Memoized rendering of paste content.
//!
//! ## Overview
//!
//! Turning a paste into markup is delegated to a [`Formatter`], which may be
//! an external process and is assumed to be expensive. [`RenderCache`] sits in
//! front of it:
//!
//! - **LRU bound**: at most [`RenderCacheConfig::capacity`] renders are kept.
//! - **Mutation aware**: a cached render is served only while it is not older
//!   than the paste's last modification.
//! - **Confidential content**: encrypted pastes are never cached.
//! - **Graceful failure**: formatter errors degrade to
//!   [`RENDER_FAILURE_PLACEHOLDER`] and are retried on the next request.
//!
//! [`LanguageRegistry`] maps a paste's language identifier to a [`Language`]
//! for the formatter and for download file extensions.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use pastegate_core::SystemClock;
//! use pastegate_render::{LanguageRegistry, PlainTextFormatter, RenderCache, RenderCacheConfig};
//!
//! let cache = RenderCache::new(
//!     RenderCacheConfig::default(),
//!     Arc::new(PlainTextFormatter),
//!     Arc::new(LanguageRegistry::builtin()),
//!     Arc::new(SystemClock),
//! )
//! .unwrap();
//! // let html = cache.render(&paste).await;
//! ```

pub mod cache;
pub mod error;
pub mod formatter;
pub mod language;

pub use cache::{
    RenderCache, RenderCacheConfig, RenderStats, DEFAULT_RENDER_CACHE_CAPACITY,
    RENDER_FAILURE_PLACEHOLDER,
};
pub use error::{RenderError, Result};
pub use formatter::{escape_html, Formatter, PlainTextFormatter};
pub use language::{Language, LanguageGroup, LanguageRegistry, FALLBACK_EXTENSION};
