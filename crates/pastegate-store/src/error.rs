//! Error types for the store module.

use pastegate_core::PasteId;
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Paste not found.
    #[error("paste not found: {0}")]
    PasteNotFound(PasteId),

    /// Paste is encrypted and no passphrase was supplied.
    #[error("paste {0} is encrypted")]
    PasteEncrypted(PasteId),

    /// Paste is encrypted and the supplied passphrase is wrong.
    #[error("invalid passphrase for paste {0}")]
    InvalidPassphrase(PasteId),

    /// Could not allocate a fresh paste id.
    #[error("paste id space exhausted after {0} attempts")]
    IdExhausted(usize),

    /// The backend could not be reached.
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// Invalid data in storage.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
