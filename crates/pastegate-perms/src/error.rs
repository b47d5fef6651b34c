//! Error types for the permissions module.

use thiserror::Error;

/// Errors that can occur during permission operations.
#[derive(Debug, Error)]
pub enum PermsError {
    /// The requester lacks the rights an operation needs.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// A grant could not be redeemed.
    ///
    /// Deliberately carries no detail: unknown, used and expired tokens are
    /// indistinguishable to the caller.
    #[error("grant redemption denied")]
    RedemptionDenied,

    /// Invalid grant request.
    #[error("invalid grant: {0}")]
    InvalidGrant(String),

    /// Could not mint a unique grant id.
    #[error("grant id space exhausted after {0} attempts")]
    GrantIdExhausted(usize),

    /// The account service failed.
    #[error("account service error: {0}")]
    AccountBackend(String),

    /// Session payload could not be encoded.
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// Grant store error.
    #[error("store error: {0}")]
    Store(#[from] pastegate_store::StoreError),

    /// Core error.
    #[error("core error: {0}")]
    CoreError(#[from] pastegate_core::CoreError),
}

/// Result type for permission operations.
pub type Result<T> = std::result::Result<T, PermsError>;
