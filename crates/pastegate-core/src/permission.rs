//! Capability bits.
//!
//! A [`Permission`] is a bitmask over the four named rights a requester can
//! hold on a paste. Checks are containment checks: `has(EDIT | DELETE)` is true
//! only when both bits are present.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign, Not, Sub};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// A set of capability bits.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(u32);

impl Permission {
    /// No rights at all.
    pub const NONE: Self = Self(0);
    /// May read the paste.
    pub const VIEW: Self = Self(1 << 0);
    /// May change the paste body and metadata.
    pub const EDIT: Self = Self(1 << 1);
    /// May erase the paste.
    pub const DELETE: Self = Self(1 << 2);
    /// May mint grants for the paste.
    pub const GRANT: Self = Self(1 << 3);
    /// Union of every defined bit.
    pub const ALL: Self = Self(Self::VIEW.0 | Self::EDIT.0 | Self::DELETE.0 | Self::GRANT.0);

    const NAMES: [(Permission, &'static str); 4] = [
        (Self::VIEW, "view"),
        (Self::EDIT, "edit"),
        (Self::DELETE, "delete"),
        (Self::GRANT, "grant"),
    ];

    /// Raw bit representation.
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Build from raw bits, rejecting bits outside [`Permission::ALL`].
    pub fn from_bits(bits: u32) -> Result<Self> {
        if bits & !Self::ALL.0 != 0 {
            return Err(CoreError::UnknownPermissionBits(bits));
        }
        Ok(Self(bits))
    }

    /// Build from raw bits, dropping anything undefined.
    pub const fn from_bits_truncate(bits: u32) -> Self {
        Self(bits & Self::ALL.0)
    }

    /// True when every bit of `other` is present in `self`.
    pub const fn contains(self, other: Permission) -> bool {
        self.0 & other.0 == other.0
    }

    /// True when no bit is set.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Bits present in `self` but not in `other`.
    pub const fn difference(self, other: Permission) -> Self {
        Self(self.0 & !other.0)
    }

    /// Iterate the single named bits set in this mask.
    pub fn iter(self) -> impl Iterator<Item = Permission> {
        Self::NAMES
            .into_iter()
            .filter(move |(bit, _)| self.contains(*bit))
            .map(|(bit, _)| bit)
    }
}

impl BitOr for Permission {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Permission {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for Permission {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl Sub for Permission {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        self.difference(rhs)
    }
}

impl Not for Permission {
    type Output = Self;

    fn not(self) -> Self {
        Self(!self.0 & Self::ALL.0)
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let mut first = true;
        for (bit, name) in Self::NAMES {
            if self.contains(bit) {
                if !first {
                    f.write_str("|")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Permission({})", self)
    }
}

/// Class of resource a permission applies to.
///
/// Account scopes are looked up per class; pastes are the only class today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PermissionClass {
    Paste,
}
