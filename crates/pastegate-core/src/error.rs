//! Error types for pastegate core.

use thiserror::Error;

use crate::validation::ByteSize;

/// Errors raised while validating or parsing core values.
///
/// All of these are rejected before any state is mutated.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("paste body is empty")]
    EmptyContent,

    #[error("input ({size}) exceeds the maximum paste length, which is {max}")]
    ContentTooLarge { size: ByteSize, max: ByteSize },

    #[error("invalid expiration: {0}")]
    InvalidExpiration(String),

    #[error("invalid paste id: {0:?}")]
    InvalidPasteId(String),

    #[error("invalid grant id")]
    InvalidGrantId,

    #[error("unknown permission bits: {0:#x}")]
    UnknownPermissionBits(u32),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
