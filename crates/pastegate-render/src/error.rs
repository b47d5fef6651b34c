//! Error types for the render module.
//!
//! Formatter failures never show up here: they degrade to a placeholder
//! inside [`RenderCache`](crate::RenderCache).

use thiserror::Error;

/// Errors that can occur while setting up rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Language definitions could not be parsed.
    #[error("invalid language registry: {0}")]
    InvalidRegistry(#[from] serde_json::Error),

    /// Two languages claim the same id or alternate id.
    #[error("duplicate language id: {0}")]
    DuplicateLanguage(String),

    /// Cache capacity must be at least one entry.
    #[error("render cache capacity must be non-zero")]
    ZeroCapacity,
}

/// Result type for render operations.
pub type Result<T> = std::result::Result<T, RenderError>;
