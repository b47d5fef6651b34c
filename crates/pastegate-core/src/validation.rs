//! Content validation.
//!
//! Bodies are checked before any state mutation: blank bodies and bodies over
//! the configured length are rejected outright.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Default maximum paste length (1 MiB).
pub const MAX_PASTE_LENGTH: usize = 1_048_576;

/// A byte count that renders with a binary unit suffix.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ByteSize(pub u64);

impl fmt::Display for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];
        if self.0 < 1024 {
            return write!(f, "{} B", self.0);
        }
        let mut value = self.0 as f64 / 1024.0;
        let mut unit = 0;
        while value >= 1024.0 && unit < UNITS.len() - 1 {
            value /= 1024.0;
            unit += 1;
        }
        write!(f, "{:.1} {}", value, UNITS[unit])
    }
}

impl fmt::Debug for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ByteSize({})", self.0)
    }
}

/// Validate a paste body against the length limit.
pub fn validate_body(body: &[u8], max_len: usize) -> Result<()> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(CoreError::EmptyContent);
    }
    if body.len() > max_len {
        return Err(CoreError::ContentTooLarge {
            size: ByteSize(body.len() as u64),
            max: ByteSize(max_len as u64),
        });
    }
    Ok(())
}
