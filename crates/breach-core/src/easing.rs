//! Progress, easing, and countdown math for transitioning events.
//!
//! Progress is the elapsed fraction of the validity window, clamped to
//! `[0, 1]`. The expanding circle follows an ease-out-quadratic curve so it
//! grows quickly at first and slows towards the end:
//!
//! ```text
//! eased = 1 - (1 - p)^2
//! ```

use std::time::Duration;

/// Ease-out-quadratic curve. Input is clamped to `[0, 1]`.
pub fn ease_out_quad(x: f32) -> f32 {
    let x = if x.is_nan() { 0.0 } else { x.clamp(0.0, 1.0) };
    let inv = 1.0 - x;
    inv.mul_add(-inv, 1.0)
}

/// Linear progress through `window` after `elapsed`, clamped to `[0, 1]`.
///
/// A zero-length window counts as already complete.
pub fn linear_progress(elapsed: Duration, window: Duration) -> f32 {
    if window.is_zero() {
        return 1.0;
    }
    (elapsed.as_secs_f32() / window.as_secs_f32()).min(1.0)
}

/// Eased progress through `window` after `elapsed`.
pub fn eased_progress(elapsed: Duration, window: Duration) -> f32 {
    ease_out_quad(linear_progress(elapsed, window))
}

/// Time left in `window` after `elapsed`, never negative.
pub const fn remaining(elapsed: Duration, window: Duration) -> Duration {
    window.saturating_sub(elapsed)
}

/// Format a remaining duration with one decimal and a unit suffix,
/// e.g. `"12.3s"`.
pub fn format_remaining(remaining: Duration, unit: &str) -> String {
    format!("{:.1}{unit}", remaining.as_secs_f32())
}

/// Radius of the expanding circle for an eased progress value.
pub fn expanding_radius(max_radius: f32, eased: f32, scale: f32) -> f32 {
    max_radius * eased.clamp(0.0, 1.0) * scale
}
