//! Service configuration.

use std::time::Duration;

use pastegate_core::MAX_PASTE_LENGTH;
use pastegate_perms::GrantConfig;
use pastegate_render::RenderCacheConfig;
use pastegate_store::dedup::DEFAULT_DEDUP_TTL;
use pastegate_store::ThrottleConfig;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ServiceError};

/// Longest expiration a paste may request.
pub const MAX_EXPIRATION: Duration = Duration::from_secs(15 * 24 * 3600);

/// Configuration for [`PasteService`](crate::PasteService).
///
/// Every field has a production default; a JSON document only needs the
/// fields it wants to override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Largest accepted paste body, in bytes.
    pub max_paste_length: usize,
    /// Requested expirations are clamped to this.
    pub max_expiration: Duration,
    /// How long identical submissions from one source are folded together.
    pub dedup_ttl: Duration,
    /// Failed-passphrase throttling.
    pub throttle: ThrottleConfig,
    /// Render cache sizing.
    pub render_cache: RenderCacheConfig,
    /// Grant minting policy.
    pub grants: GrantConfig,
    /// Whether pastes are readable without an explicit View bit.
    pub default_view_allowed: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_paste_length: MAX_PASTE_LENGTH,
            max_expiration: MAX_EXPIRATION,
            dedup_ttl: DEFAULT_DEDUP_TTL,
            throttle: ThrottleConfig::default(),
            render_cache: RenderCacheConfig::default(),
            grants: GrantConfig::default(),
            default_view_allowed: true,
        }
    }
}

impl ServiceConfig {
    /// Parse a configuration, filling unspecified fields with defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| ServiceError::Config(e.to_string()))
    }
}
