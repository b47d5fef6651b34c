//! Error types for the paste service.

use std::fmt;

use pastegate_core::{CoreError, PasteId};
use pastegate_perms::PermsError;
use pastegate_store::StoreError;
use thiserror::Error;

/// The action an access check guarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    View,
    Edit,
    Delete,
    Grant,
    Redeem,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::View => "view",
            Action::Edit => "modify",
            Action::Delete => "delete",
            Action::Grant => "grant",
            Action::Redeem => "redeem",
        })
    }
}

/// Errors that can occur during service operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A capability check failed.
    ///
    /// Redemption failures carry no paste id, so callers cannot tell an
    /// unknown token from a used one.
    #[error("access denied: cannot {action}{}", paste_id.as_ref().map(|p| format!(" paste {p}")).unwrap_or_default())]
    AccessDenied {
        action: Action,
        paste_id: Option<PasteId>,
    },

    /// The paste does not exist.
    #[error("paste not found: {0}")]
    NotFound(PasteId),

    /// Content or request validation failed before any state changed.
    #[error("validation error: {0}")]
    Validation(#[from] CoreError),

    /// The paste is encrypted and the requester has no passphrase for it.
    #[error("paste {0} requires a passphrase")]
    PassphraseRequired(PasteId),

    /// The supplied passphrase does not unlock the paste.
    #[error("invalid passphrase for paste {0}")]
    InvalidPassphrase(PasteId),

    /// Too many failed passphrase attempts.
    #[error("too many failed attempts for paste {0}")]
    Throttled(PasteId),

    /// Malformed request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Configuration could not be loaded.
    #[error("config error: {0}")]
    Config(String),

    /// A collaborator failed.
    #[error("backend failure: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ServiceError {
    /// Access denied for `action` on `paste_id`.
    pub fn denied(action: Action, paste_id: &PasteId) -> Self {
        ServiceError::AccessDenied {
            action,
            paste_id: Some(paste_id.clone()),
        }
    }

    /// Whether this is an access denial.
    pub fn is_access_denied(&self) -> bool {
        matches!(self, ServiceError::AccessDenied { .. })
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::PasteNotFound(id) => ServiceError::NotFound(id),
            StoreError::PasteEncrypted(id) => ServiceError::PassphraseRequired(id),
            StoreError::InvalidPassphrase(id) => ServiceError::InvalidPassphrase(id),
            other => ServiceError::Backend(Box::new(other)),
        }
    }
}

impl From<PermsError> for ServiceError {
    fn from(err: PermsError) -> Self {
        match err {
            PermsError::RedemptionDenied => ServiceError::AccessDenied {
                action: Action::Redeem,
                paste_id: None,
            },
            PermsError::InvalidGrant(msg) => ServiceError::InvalidRequest(msg),
            PermsError::CoreError(e) => ServiceError::Validation(e),
            PermsError::Store(e) => e.into(),
            other => ServiceError::Backend(Box::new(other)),
        }
    }
}

/// Result type for service operations.
pub type Result<T> = std::result::Result<T, ServiceError>;
