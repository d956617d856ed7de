//! Enumeration types for tracked events and their on-screen indicators.

use serde::{Deserialize, Serialize};

/// Lifecycle phase of a tracked event.
///
/// `Active -> Transitioning -> Expired` and `Active -> (removed)` are the
/// only reachable paths. `Expired` is computed, never stored: a record
/// that reaches it is dropped in the same reconcile pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventPhase {
    /// Discovered and present in the world, not yet transitioned.
    Active,
    /// Transitioned; inside its validity window.
    Transitioning,
    /// Past its validity window. Triggers removal.
    Expired,
}

impl EventPhase {
    /// Whether the phase should still be shown.
    pub const fn is_visible(self) -> bool {
        matches!(self, Self::Active | Self::Transitioning)
    }
}

/// Which of the two indicator circles a descriptor describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircleKind {
    /// Fixed-radius marker drawn for every visible event.
    Static,
    /// Eased, growing radius drawn while an event is transitioning.
    Expanding,
}

/// Color selection for an indicator circle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircleColor {
    /// Marker color.
    Purple,
    /// Expansion color.
    White,
}

impl CircleKind {
    /// Color used for this kind of circle.
    pub const fn color(self) -> CircleColor {
        match self {
            Self::Static => CircleColor::Purple,
            Self::Expanding => CircleColor::White,
        }
    }
}
