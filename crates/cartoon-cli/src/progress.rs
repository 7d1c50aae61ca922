//! Progress bar tracking retired cartoons.

use indicatif::{ProgressBar, ProgressStyle};

use cartoon_orchestration::interfaces::PoolObserver;

const TEMPLATE: &str = "{spinner} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} cartoons retired";

/// Observer drawing an `indicatif` progress bar.
pub struct ProgressBarObserver {
    bar: ProgressBar,
}

impl ProgressBarObserver {
    /// Create a bar for `total` cartoons. A hidden bar draws nothing.
    #[must_use]
    pub fn new(total: usize, hidden: bool) -> Self {
        let bar = if hidden {
            ProgressBar::hidden()
        } else {
            ProgressBar::new(total as u64)
        };
        bar.set_style(
            ProgressStyle::with_template(TEMPLATE).unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        Self { bar }
    }

    /// Current bar position.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.bar.position()
    }
}

impl PoolObserver for ProgressBarObserver {
    fn on_progress(&self, retired: usize, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_position(retired as u64);
    }

    fn complete(&self) {
        self.bar.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_bar_tracks_position() {
        let observer = ProgressBarObserver::new(4, true);
        observer.on_progress(3, 4);
        assert_eq!(observer.position(), 3);
        observer.complete();
    }
}
