//! Shared value types for the breach overlay.
//!
//! Everything that crosses the boundary between the game environment and
//! the tracker core is defined here as a plain, copyable value. The core
//! never holds a reference into the environment's object graph; it only
//! keeps the positions and flags copied out of each snapshot.
//!
//! # Modules
//!
//! - [`ids`] -- Entity and area identifiers
//! - [`enums`] -- Event phase and circle color enumerations
//! - [`structs`] -- Grid positions, entity snapshots, and frame descriptors

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{CircleColor, CircleKind, EventPhase};
pub use ids::{AreaId, EntityId};
pub use structs::{
    CircleDescriptor, EntitySnapshot, EventView, GridPos, TimerText, TrackerSummary,
    TransitionView, WorldSnapshot,
};
