//! Paste records.
//!
//! A [`Paste`] is a snapshot handed out by the content store. The core never
//! persists pastes itself; it reads them, decides what the requester may do,
//! and hands modified snapshots back to the store.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::PasteId;

/// A snapshot of a stored paste.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paste {
    /// The paste identity.
    pub id: PasteId,

    /// Optional user-supplied title.
    pub title: Option<String>,

    /// Language identifier used to pick a formatter.
    pub language: String,

    /// Raw body. Plaintext even for encrypted pastes once unlocked.
    pub body: Bytes,

    /// Whether the content store holds this paste encrypted.
    pub encrypted: bool,

    /// Requested lifetime, if any.
    pub expiration: Option<Expiration>,

    /// Creation time (Unix ms).
    pub created_at: i64,

    /// Last modification time (Unix ms).
    pub modified_at: i64,
}

impl Paste {
    /// The body as text, replacing invalid UTF-8.
    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// A serializable view of this paste.
    pub fn to_document(&self) -> PasteDocument {
        PasteDocument {
            id: self.id.clone(),
            language: self.language.clone(),
            encrypted: self.encrypted,
            expiration: self.expiration.map(|e| e.to_string()),
            body: self.body_text().into_owned(),
        }
    }
}

/// Input for creating a paste.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PasteDraft {
    pub title: Option<String>,
    pub language: Option<String>,
    pub body: Bytes,
    pub expiration: Option<Expiration>,
}

impl PasteDraft {
    /// A draft with only a body.
    pub fn new(body: impl Into<Bytes>) -> Self {
        Self {
            body: body.into(),
            ..Self::default()
        }
    }

    /// Set the language.
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Set the title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the expiration.
    pub fn expiration(mut self, expiration: Expiration) -> Self {
        self.expiration = Some(expiration);
        self
    }
}

/// JSON view of a readable paste.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasteDocument {
    pub id: PasteId,
    pub language: String,
    pub encrypted: bool,
    pub expiration: Option<String>,
    pub body: String,
}

/// Requested paste lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Expiration {
    /// Keep until deleted.
    Never,
    /// Delete after the given duration.
    After(Duration),
}

impl Expiration {
    /// Cap an `After` duration at `max`.
    pub fn clamp(self, max: Duration) -> Self {
        match self {
            Expiration::After(d) if d > max => Expiration::After(max),
            other => other,
        }
    }
}

const UNITS: [(char, u64); 5] = [
    ('w', 7 * 24 * 3600),
    ('d', 24 * 3600),
    ('h', 3600),
    ('m', 60),
    ('s', 1),
];

impl FromStr for Expiration {
    type Err = CoreError;

    /// Parses `-1` (never), bare seconds, or a number with one of the
    /// suffixes `s`, `m`, `h`, `d`, `w`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == "-1" {
            return Ok(Expiration::Never);
        }
        let invalid = || CoreError::InvalidExpiration(s.to_string());

        let (digits, multiplier) = match s.char_indices().last() {
            Some((idx, c)) if c.is_ascii_alphabetic() => {
                let unit = UNITS
                    .iter()
                    .find(|(u, _)| *u == c.to_ascii_lowercase())
                    .ok_or_else(invalid)?;
                (&s[..idx], unit.1)
            }
            Some(_) => (s, 1),
            None => return Err(invalid()),
        };

        let n: u64 = digits.parse().map_err(|_| invalid())?;
        if n == 0 {
            return Err(invalid());
        }
        let secs = n.checked_mul(multiplier).ok_or_else(invalid)?;
        Ok(Expiration::After(Duration::from_secs(secs)))
    }
}

impl fmt::Display for Expiration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expiration::Never => f.write_str("-1"),
            Expiration::After(d) => {
                let secs = d.as_secs();
                let (unit, size) = UNITS
                    .iter()
                    .find(|(_, size)| secs >= *size && secs % size == 0)
                    .copied()
                    .unwrap_or(('s', 1));
                write!(f, "{}{}", secs / size, unit)
            }
        }
    }
}
