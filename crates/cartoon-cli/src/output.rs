//! CLI output formatting.

use std::time::Duration;

use cartoon_core::cartoon::{CartoonSnapshot, TimerState};

/// Format a duration for display.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 0.001 {
        format!("{:.2}µs", secs * 1_000_000.0)
    } else if secs < 1.0 {
        format!("{:.2}ms", secs * 1000.0)
    } else if secs < 60.0 {
        format!("{secs:.3}s")
    } else {
        let mins = (secs / 60.0).floor() as u64;
        let remaining = secs - (mins as f64 * 60.0);
        format!("{mins}m{remaining:.1}s")
    }
}

/// Short label for a timer state.
#[must_use]
pub fn state_label(state: TimerState) -> &'static str {
    match state {
        TimerState::Unarmed => "unarmed",
        TimerState::Armed => "armed",
        TimerState::Terminal => "terminal",
        TimerState::Cancelled => "cancelled",
    }
}

/// One table row for a cartoon.
#[must_use]
pub fn format_cartoon_row(cartoon: &CartoonSnapshot) -> String {
    let outcome = if cartoon.terminal { "done" } else { "cut short" };
    format!(
        "  {:<16} {:>6} {:>6} {:>9}  {:<9} {}",
        cartoon.name,
        cartoon.budget,
        cartoon.fired,
        cartoon.remaining,
        state_label(cartoon.state),
        outcome,
    )
}
