//! Frame loop runner.
//!
//! [`run_overlay`] drives [`run_tick`] at a fixed frame interval until
//! either the configured frame budget is used up or the shutdown future
//! resolves. Shutdown is only observed between frames, so a frame always
//! completes once it has started.
//!
//! [`run_tick`]: crate::tick::run_tick

use std::future::Future;
use std::time::Duration;

use tokio::time::{Interval, MissedTickBehavior};
use tracing::{info, warn};

use crate::clock::TimeSource;
use crate::config::RunnerConfig;
use crate::presentation::PresentationAdapter;
use crate::source::WorldSnapshotSource;
use crate::tick::{self, OverlayState, TickError, TickSummary};

/// Errors that can occur during the overlay run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A frame failed.
    #[error("tick error: {source}")]
    Tick {
        /// The underlying tick error.
        #[from]
        source: TickError,
    },
}

/// Why the frame loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayEndReason {
    /// `max_ticks` frames were run.
    MaxTicksReached,
    /// The shutdown future resolved.
    Shutdown,
}

/// Result of an overlay run.
#[derive(Debug)]
pub struct OverlayResult {
    /// The reason the loop ended.
    pub end_reason: OverlayEndReason,
    /// The last frame summary, if any frame completed.
    pub final_summary: Option<TickSummary>,
    /// Total number of frames executed.
    pub total_ticks: u64,
}

/// Run frames until `config.max_ticks` is reached or `shutdown` resolves.
///
/// # Arguments
///
/// * `state` - Tracker and clock carried between frames
/// * `source` - World snapshot source
/// * `time` - Monotonic time source, sampled once per frame
/// * `presenter` - Drawing backend
/// * `config` - Frame interval and frame budget
/// * `shutdown` - Resolves when the loop should stop
///
/// # Errors
///
/// Returns [`RunnerError`] if a frame fails unrecoverably.
pub async fn run_overlay<F>(
    state: &mut OverlayState,
    source: &mut dyn WorldSnapshotSource,
    time: &dyn TimeSource,
    presenter: &mut dyn PresentationAdapter,
    config: &RunnerConfig,
    shutdown: F,
) -> Result<OverlayResult, RunnerError>
where
    F: Future<Output = ()>,
{
    let mut last_summary: Option<TickSummary> = None;
    let mut total_ticks: u64 = 0;
    let mut interval = frame_interval(config.frame_interval_ms);
    tokio::pin!(shutdown);

    info!(
        frame_interval_ms = config.frame_interval_ms,
        max_ticks = config.max_ticks,
        "Overlay starting"
    );

    loop {
        // --- Check frame budget ---
        if config.max_ticks > 0 && total_ticks >= config.max_ticks {
            info!(total_ticks, max_ticks = config.max_ticks, "Frame limit reached");
            return Ok(OverlayResult {
                end_reason: OverlayEndReason::MaxTicksReached,
                final_summary: last_summary,
                total_ticks,
            });
        }

        // --- Wait for the next frame, or stop ---
        tokio::select! {
            biased;
            () = &mut shutdown => {
                info!(total_ticks, "Shutdown requested");
                return Ok(OverlayResult {
                    end_reason: OverlayEndReason::Shutdown,
                    final_summary: last_summary,
                    total_ticks,
                });
            }
            () = wait_for_frame(interval.as_mut()) => {}
        }

        // --- Execute frame ---
        let summary = tick::run_tick(state, source, time, presenter)?;
        total_ticks = total_ticks.saturating_add(1);
        last_summary = Some(summary);
    }
}

/// Log the end of an overlay run.
pub fn log_overlay_end(result: &OverlayResult) {
    info!(
        reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        final_tick = result.final_summary.as_ref().map(|s| s.tick),
        "Overlay stopped"
    );

    if let Some(ref summary) = result.final_summary {
        info!(
            tick = summary.tick,
            tracked = summary.summary.tracked,
            transitioning = summary.summary.transitioning,
            "Final frame summary"
        );
    } else {
        warn!("Overlay stopped with no frames executed");
    }
}

fn frame_interval(frame_interval_ms: u64) -> Option<Interval> {
    (frame_interval_ms > 0).then(|| {
        let mut interval = tokio::time::interval(Duration::from_millis(frame_interval_ms));
        // Late frames are dropped, not replayed.
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        interval
    })
}

async fn wait_for_frame(interval: Option<&mut Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => tokio::task::yield_now().await,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use breach_types::{AreaId, EntityId, EntitySnapshot, GridPos, WorldSnapshot};

    use super::*;
    use crate::clock::{ManualTime, Timestamp};
    use crate::presentation::{DisplaySettings, FramePlan, PresentationError};
    use crate::source::ScriptedSource;
    use crate::tracker::{EventTracker, TrackerSettings};

    struct CountingPresenter {
        frames: u64,
    }

    impl PresentationAdapter for CountingPresenter {
        fn draw(&mut self, _frame: &FramePlan) -> Result<(), PresentationError> {
            self.frames = self.frames.saturating_add(1);
            Ok(())
        }
    }

    fn bounded(max_ticks: u64) -> RunnerConfig {
        RunnerConfig {
            frame_interval_ms: 0,
            max_ticks,
        }
    }

    fn state() -> OverlayState {
        OverlayState::new(
            EventTracker::new(TrackerSettings::default()),
            DisplaySettings::default(),
        )
    }

    fn breach_frame(area: AreaId, transitioned: bool) -> WorldSnapshot {
        WorldSnapshot {
            area,
            observer: Some(GridPos::ORIGIN),
            entities: vec![EntitySnapshot {
                id: EntityId(42),
                type_path: String::from("Metadata/MiscellaneousObjects/Breach/BreachObject"),
                position: Some(GridPos::new(2.0, 2.0)),
                transitioned,
                is_valid: true,
            }],
        }
    }

    #[tokio::test]
    async fn bounded_by_max_ticks() {
        let mut state = state();
        let mut source = ScriptedSource::new(Vec::new());
        let time = ManualTime::with_step(Timestamp::ZERO, Duration::from_millis(16));
        let mut presenter = CountingPresenter { frames: 0 };

        let result = run_overlay(
            &mut state,
            &mut source,
            &time,
            &mut presenter,
            &bounded(5),
            std::future::pending(),
        )
        .await
        .unwrap();

        assert_eq!(result.end_reason, OverlayEndReason::MaxTicksReached);
        assert_eq!(result.total_ticks, 5);
        assert_eq!(presenter.frames, 5);
        assert_eq!(result.final_summary.map(|s| s.tick), Some(5));
    }

    #[tokio::test]
    async fn shutdown_before_first_frame() {
        let mut state = state();
        let mut source = ScriptedSource::new(Vec::new());
        let time = ManualTime::new(Timestamp::ZERO);
        let mut presenter = CountingPresenter { frames: 0 };

        let result = run_overlay(
            &mut state,
            &mut source,
            &time,
            &mut presenter,
            &bounded(0),
            std::future::ready(()),
        )
        .await
        .unwrap();

        assert_eq!(result.end_reason, OverlayEndReason::Shutdown);
        assert_eq!(result.total_ticks, 0);
        assert!(result.final_summary.is_none());
    }

    #[tokio::test]
    async fn countdown_runs_out_across_frames() {
        let area = AreaId::new();
        let mut source = ScriptedSource::new(vec![
            breach_frame(area, false),
            breach_frame(area, true),
        ]);
        // One second per frame: transition at t=1s, gone after t=54s.
        let time = ManualTime::with_step(Timestamp::ZERO, Duration::from_secs(1));
        let mut state = state();
        let mut presenter = CountingPresenter { frames: 0 };

        let result = run_overlay(
            &mut state,
            &mut source,
            &time,
            &mut presenter,
            &bounded(60),
            std::future::pending(),
        )
        .await
        .unwrap();

        assert_eq!(result.total_ticks, 60);
        assert!(state.tracker.is_empty());
    }

    #[tokio::test]
    async fn paced_by_frame_interval() {
        let mut state = state();
        let mut source = ScriptedSource::new(Vec::new());
        let time = ManualTime::new(Timestamp::ZERO);
        let mut presenter = CountingPresenter { frames: 0 };
        let config = RunnerConfig {
            frame_interval_ms: 1,
            max_ticks: 3,
        };

        let result = run_overlay(
            &mut state,
            &mut source,
            &time,
            &mut presenter,
            &config,
            std::future::pending(),
        )
        .await
        .unwrap();

        assert_eq!(result.total_ticks, 3);
    }
}
