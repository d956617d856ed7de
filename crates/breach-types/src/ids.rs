//! Identifier wrappers.
//!
//! [`EntityId`] is the opaque key the environment hands out for each live
//! entity. Depending on the environment it may be a stable id or a memory
//! address; either way the tracker only compares it for equality and drops
//! everything it knows when the [`AreaId`] changes.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque identity of a live entity in the game world.
///
/// The value `0` is reserved for a null (unaddressable) reference and is
/// never tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl EntityId {
    /// The null identity (zero address).
    pub const NULL: Self = Self(0);

    /// Whether this identity refers to a null / zero-address entity.
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Return the raw key.
    pub const fn into_inner(self) -> u64 {
        self.0
    }
}

impl core::fmt::Display for EntityId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl From<u64> for EntityId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

/// Identifier for one area instance (map load).
///
/// A new area instance means every entity identity seen so far is stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AreaId(pub Uuid);

impl AreaId {
    /// Create a new area identifier using UUID v7 (time-ordered).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Return the inner [`Uuid`] value.
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for AreaId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for AreaId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for AreaId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}
