//! Frame output adapters.
//!
//! Without a drawing backend the overlay reports each frame plan in one of
//! two ways, selected by `logging.output`:
//!
//! - [`LogPresenter`] logs the HUD line and countdown whenever either one
//!   changes.
//! - [`JsonLinesPresenter`] writes every frame plan as one JSON object per
//!   line.

use std::io::Write;

use breach_core::presentation::{FramePlan, PresentationAdapter, PresentationError};
use breach_types::TrackerSummary;
use tracing::{debug, info};

/// Logs HUD changes through `tracing`.
#[derive(Debug, Default)]
pub struct LogPresenter {
    last_summary: Option<TrackerSummary>,
    last_timer: Option<String>,
}

impl LogPresenter {
    /// Create a presenter that has not logged anything yet.
    pub const fn new() -> Self {
        Self {
            last_summary: None,
            last_timer: None,
        }
    }
}

impl PresentationAdapter for LogPresenter {
    fn draw(&mut self, frame: &FramePlan) -> Result<(), PresentationError> {
        let timer = frame.timer.as_ref().map(|timer| timer.text.clone());

        if self.last_summary != Some(frame.summary) {
            info!(
                tracked = frame.summary.tracked,
                transitioning = frame.summary.transitioning,
                "{}",
                frame.hud_line()
            );
            self.last_summary = Some(frame.summary);
        }

        // Countdown text changes nearly every frame.
        if timer != self.last_timer {
            if let Some(ref text) = timer {
                debug!(
                    countdown = %text,
                    rings = frame.expanding_circles.len(),
                    markers = frame.static_circles.len(),
                    "breach countdown"
                );
            }
            self.last_timer = timer;
        }

        Ok(())
    }
}

/// Writes each frame plan as a JSON line.
#[derive(Debug)]
pub struct JsonLinesPresenter<W> {
    out: W,
}

impl<W: Write> JsonLinesPresenter<W> {
    /// Create a presenter writing to `out`.
    pub const fn new(out: W) -> Self {
        Self { out }
    }

    /// Consume the presenter and return the writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> PresentationAdapter for JsonLinesPresenter<W> {
    fn draw(&mut self, frame: &FramePlan) -> Result<(), PresentationError> {
        serde_json::to_writer(&mut self.out, frame).map_err(|e| PresentationError::Draw {
            message: format!("failed to encode frame: {e}"),
        })?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        Ok(())
    }
}

/// Build the presenter named by `logging.output`.
///
/// Any value other than `json` selects the log presenter; the config
/// loader has already rejected unknown names.
pub fn for_output(output: &str) -> Box<dyn PresentationAdapter> {
    if output == "json" {
        Box::new(JsonLinesPresenter::new(std::io::stdout()))
    } else {
        Box::new(LogPresenter::new())
    }
}
