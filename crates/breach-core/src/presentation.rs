//! Frame planning: what to draw, computed without drawing anything.
//!
//! [`plan_frame`] turns the tracker's state into a [`FramePlan`] of circle
//! descriptors and at most one countdown string. It has no side effects,
//! so it can be tested without a drawing backend and a failing
//! [`PresentationAdapter`] can never disturb the tracker.

use breach_types::{CircleDescriptor, CircleKind, GridPos, TimerText, TrackerSummary};
use serde::{Deserialize, Serialize};

use crate::clock::Timestamp;
use crate::easing;
use crate::tracker::EventTracker;

/// Errors reported by a presentation backend.
#[derive(Debug, thiserror::Error)]
pub enum PresentationError {
    /// The backend failed to draw the frame.
    #[error("draw failed: {message}")]
    Draw {
        /// Description of the failure.
        message: String,
    },

    /// Writing frame output failed.
    #[error("frame output failed: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },
}

/// Sizes and formatting used when planning a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplaySettings {
    /// Radius the expanding circle reaches at the end of the window.
    pub max_circle_size: f32,
    /// Radius of the fixed marker circle.
    pub static_circle_size: f32,
    /// Multiplier applied to every radius.
    pub scale: f32,
    /// Suffix appended to the countdown text.
    pub timer_unit: String,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            max_circle_size: 455.0,
            static_circle_size: 455.0,
            scale: 1.0,
            timer_unit: String::from("s"),
        }
    }
}

/// Everything the presentation layer needs for one frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FramePlan {
    /// Counts for the HUD line.
    pub summary: TrackerSummary,
    /// Fixed-radius markers, nearest first.
    pub static_circles: Vec<CircleDescriptor>,
    /// Expanding rings for events inside their window, nearest first.
    pub expanding_circles: Vec<CircleDescriptor>,
    /// Countdown for the soonest-expiring event.
    pub timer: Option<TimerText>,
}

impl FramePlan {
    /// The HUD summary line.
    pub fn hud_line(&self) -> String {
        format!(
            "Breaches: {} (Transitioned: {})",
            self.summary.tracked, self.summary.transitioning
        )
    }
}

/// A drawing backend.
///
/// Called once per frame with the frame plan. Errors are logged by the
/// caller and otherwise ignored.
pub trait PresentationAdapter {
    /// Draw one frame.
    fn draw(&mut self, frame: &FramePlan) -> Result<(), PresentationError>;
}

/// A presentation adapter that draws nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPresenter;

impl PresentationAdapter for NullPresenter {
    fn draw(&mut self, _frame: &FramePlan) -> Result<(), PresentationError> {
        Ok(())
    }
}

/// Compute the frame plan for `now` as seen from `observer`.
pub fn plan_frame(
    tracker: &EventTracker,
    observer: GridPos,
    now: Timestamp,
    display: &DisplaySettings,
) -> FramePlan {
    let static_radius = display.static_circle_size * display.scale;

    let static_circles = tracker
        .active_events(observer)
        .into_iter()
        .map(|view| CircleDescriptor {
            id: view.id,
            center: view.position,
            radius: static_radius,
            kind: CircleKind::Static,
            color: CircleKind::Static.color(),
        })
        .collect();

    let transitioning = tracker.transitioning_events(observer, now);

    let expanding_circles = transitioning
        .iter()
        .map(|view| CircleDescriptor {
            id: view.id,
            center: view.position,
            radius: easing::expanding_radius(display.max_circle_size, view.progress, display.scale),
            kind: CircleKind::Expanding,
            color: CircleKind::Expanding.color(),
        })
        .collect();

    // Soonest to expire wins; the list is already nearest first, so
    // min_by_key keeps the nearer of two equal countdowns.
    let timer = transitioning
        .iter()
        .min_by_key(|view| view.remaining)
        .map(|view| TimerText {
            id: view.id,
            text: easing::format_remaining(view.remaining, &display.timer_unit),
            remaining: view.remaining,
        });

    FramePlan {
        summary: tracker.summary(),
        static_circles,
        expanding_circles,
        timer,
    }
}
