//! Event tracking, timer math, and the per-frame loop for the breach overlay.
//!
//! This crate owns the state machine that decides, every frame, which
//! breach events are newly discovered, which have transitioned, and which
//! have expired. Drawing is left to a [`PresentationAdapter`]; world state
//! comes from a [`WorldSnapshotSource`].
//!
//! # Modules
//!
//! - [`clock`] -- Monotonic timestamps sampled once per frame.
//! - [`config`] -- Configuration loading from `breach-overlay.yaml`.
//! - [`easing`] -- Progress, easing, and countdown formatting.
//! - [`presentation`] -- Pure frame planning and the adapter trait.
//! - [`runner`] -- Bounded async frame loop.
//! - [`source`] -- [`WorldSnapshotSource`] trait and [`ScriptedSource`].
//! - [`tick`] -- One frame: sample, reconcile, plan, draw.
//! - [`tracker`] -- [`EventTracker`], the reconciliation state machine.
//!
//! [`EventTracker`]: tracker::EventTracker
//! [`PresentationAdapter`]: presentation::PresentationAdapter
//! [`ScriptedSource`]: source::ScriptedSource
//! [`WorldSnapshotSource`]: source::WorldSnapshotSource

pub mod clock;
pub mod config;
pub mod easing;
pub mod presentation;
pub mod runner;
pub mod source;
pub mod tick;
pub mod tracker;
