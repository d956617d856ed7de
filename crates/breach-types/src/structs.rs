//! Value structs exchanged between the environment, the tracker, and the
//! presentation layer.
//!
//! Snapshot types flow in once per tick; view and descriptor types flow out
//! to whatever draws them. None of them borrow from the environment.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::enums::{CircleColor, CircleKind};
use crate::ids::{AreaId, EntityId};

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// A 2D coordinate in world-grid units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GridPos {
    /// Grid X.
    pub x: f32,
    /// Grid Y.
    pub y: f32,
}

impl GridPos {
    /// The grid origin.
    pub const ORIGIN: Self = Self { x: 0.0, y: 0.0 };

    /// Create a position from its components.
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to `other`.
    pub fn distance_sq(self, other: Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.mul_add(dx, dy * dy)
    }

    /// Whether both components are finite.
    pub const fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

// ---------------------------------------------------------------------------
// Snapshot input
// ---------------------------------------------------------------------------

/// One entity as reported by the environment for a single tick.
///
/// All fields are copies. An entry with `is_valid == false` or a null
/// identity is a stale reference and is treated as absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    /// Identity of the entity.
    pub id: EntityId,
    /// Type/metadata path used to classify the entity.
    pub type_path: String,
    /// Grid position, if the entity exposes one.
    pub position: Option<GridPos>,
    /// Whether the entity reports itself as transitioned.
    pub transitioned: bool,
    /// Whether the reference was still addressable when sampled.
    pub is_valid: bool,
}

impl EntitySnapshot {
    /// Whether the entry can be trusted this tick.
    pub const fn is_live(&self) -> bool {
        self.is_valid && !self.id.is_null()
    }
}

/// Everything the environment reports for one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// The area instance the entities belong to.
    pub area: AreaId,
    /// Observer (player) position, if known.
    pub observer: Option<GridPos>,
    /// Live entities, in no particular order. May contain duplicates.
    pub entities: Vec<EntitySnapshot>,
}

// ---------------------------------------------------------------------------
// Query output
// ---------------------------------------------------------------------------

/// A tracked or archived event as exposed to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EventView {
    /// Identity of the backing entity.
    pub id: EntityId,
    /// Position captured at discovery.
    pub position: GridPos,
    /// Whether the event has transitioned.
    pub is_transitioning: bool,
}

/// A transitioning event with its computed timer values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransitionView {
    /// Identity of the backing entity.
    pub id: EntityId,
    /// Position captured at discovery.
    pub position: GridPos,
    /// Eased progress in `[0, 1]`.
    pub progress: f32,
    /// Time left in the validity window.
    pub remaining: Duration,
}

/// Counts shown in the HUD line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerSummary {
    /// Events currently tracked (active and archived).
    pub tracked: usize,
    /// Of those, how many are transitioning.
    pub transitioning: usize,
}

// ---------------------------------------------------------------------------
// Presentation descriptors
// ---------------------------------------------------------------------------

/// A circle to draw, in world-grid space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CircleDescriptor {
    /// Event the circle belongs to.
    pub id: EntityId,
    /// Circle center.
    pub center: GridPos,
    /// Radius after scaling.
    pub radius: f32,
    /// Static marker or expanding ring.
    pub kind: CircleKind,
    /// Color selection.
    pub color: CircleColor,
}

/// The single countdown string shown for the soonest-expiring event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerText {
    /// Event the timer belongs to.
    pub id: EntityId,
    /// Display text, e.g. `"12.3s"`.
    pub text: String,
    /// Unformatted remaining time.
    pub remaining: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_euclidean() {
        let a = GridPos::new(0.0, 0.0);
        let b = GridPos::new(3.0, 4.0);
        assert!((a.distance_sq(b) - 25.0).abs() < 1e-4);
        assert!((b.distance_sq(a) - 25.0).abs() < 1e-4);
    }

    #[test]
    fn null_or_invalid_entities_are_not_live() {
        let mut e = EntitySnapshot {
            id: EntityId(7),
            type_path: String::from("Metadata/Foo"),
            position: Some(GridPos::ORIGIN),
            transitioned: false,
            is_valid: true,
        };
        assert!(e.is_live());
        e.is_valid = false;
        assert!(!e.is_live());
        e.is_valid = true;
        e.id = EntityId::NULL;
        assert!(!e.is_live());
    }

    #[test]
    fn non_finite_positions_are_detected() {
        assert!(GridPos::new(1.0, 2.0).is_finite());
        assert!(!GridPos::new(f32::NAN, 2.0).is_finite());
        assert!(!GridPos::new(1.0, f32::INFINITY).is_finite());
    }
}
