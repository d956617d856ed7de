//! One overlay frame.
//!
//! Each frame runs the same fixed sequence:
//!
//! 1. **Sample** -- advance the frame clock and take the one timestamp used
//!    for the whole frame.
//! 2. **Snapshot** -- pull the area, observer, and entity list from the
//!    [`WorldSnapshotSource`].
//! 3. **Area check** -- if the area changed, reset the tracker.
//! 4. **Reconcile** -- update the tracker against the snapshot.
//! 5. **Plan** -- compute the [`FramePlan`].
//! 6. **Draw** -- hand the plan to the [`PresentationAdapter`]. A failed draw
//!    is logged and the frame still counts as complete.

use breach_types::{AreaId, GridPos, TrackerSummary};
use tracing::{debug, info, warn};

use crate::clock::{FrameClock, TimeSource, Timestamp};
use crate::presentation::{self, DisplaySettings, PresentationAdapter};
use crate::source::WorldSnapshotSource;
use crate::tracker::{EventTracker, ReconcileReport};

/// Errors that can occur during a frame.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// A clock operation failed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: crate::clock::ClockError,
    },
}

/// Summary of a single frame.
#[derive(Debug, Clone, PartialEq)]
pub struct TickSummary {
    /// The frame number.
    pub tick: u64,
    /// The timestamp used for the frame.
    pub now: Timestamp,
    /// The area the frame was sampled in.
    pub area: AreaId,
    /// Whether the tracker was reset because the area changed.
    pub area_changed: bool,
    /// What reconciliation changed.
    pub report: ReconcileReport,
    /// Tracker counts after reconciliation.
    pub summary: TrackerSummary,
    /// Whether the presentation adapter drew the frame successfully.
    pub drawn: bool,
}

/// State carried from frame to frame.
#[derive(Debug, Clone, Default)]
pub struct OverlayState {
    /// The frame clock.
    pub clock: FrameClock,
    /// The event tracker.
    pub tracker: EventTracker,
    /// Display sizes used for planning.
    pub display: DisplaySettings,
    /// Area of the previous frame, if any frame has run.
    area: Option<AreaId>,
}

impl OverlayState {
    /// Create state for a fresh session.
    pub const fn new(tracker: EventTracker, display: DisplaySettings) -> Self {
        Self {
            clock: FrameClock::new(),
            tracker,
            display,
            area: None,
        }
    }

    /// Area of the most recent frame.
    pub const fn area(&self) -> Option<AreaId> {
        self.area
    }
}

/// Execute one overlay frame.
///
/// # Errors
///
/// Returns [`TickError::Clock`] if the frame counter overflows. Presentation
/// failures are not errors; they are logged and reported in
/// [`TickSummary::drawn`].
pub fn run_tick(
    state: &mut OverlayState,
    source: &mut dyn WorldSnapshotSource,
    time: &dyn TimeSource,
    presenter: &mut dyn PresentationAdapter,
) -> Result<TickSummary, TickError> {
    let (tick, now) = state.clock.begin_frame(time)?;
    let snapshot = source.snapshot();

    let area_changed = state.area.is_some_and(|previous| previous != snapshot.area);
    if area_changed {
        info!(tick, area = %snapshot.area, "area changed, resetting tracker");
        state.tracker.reset();
    }
    state.area = Some(snapshot.area);

    let report = state.tracker.reconcile(&snapshot.entities, now);
    if report.has_changes() {
        debug!(
            tick,
            created = report.created,
            transitioned = report.transitioned,
            disappeared = report.disappeared,
            expired = report.expired,
            "tracker reconciled"
        );
    }

    let observer = snapshot.observer.unwrap_or(GridPos::ORIGIN);
    let plan = presentation::plan_frame(&state.tracker, observer, now, &state.display);

    let drawn = match presenter.draw(&plan) {
        Ok(()) => true,
        Err(e) => {
            warn!(tick, error = %e, "presentation failed, frame skipped");
            false
        }
    };

    Ok(TickSummary {
        tick,
        now,
        area: snapshot.area,
        area_changed,
        report,
        summary: plan.summary,
        drawn,
    })
}
