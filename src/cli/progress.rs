//! Terminal progress for long running imports

use indicatif::{ProgressBar, ProgressStyle};
use protree_index::WaitingHandler;
use std::time::Duration;

/// Progress bar fed by the index builder. Never requests cancellation.
pub struct ProgressHandler {
    bar: ProgressBar,
}

impl ProgressHandler {
    pub fn new(message: &str) -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{msg} [{bar:40.cyan/blue}] {pos:>7}/{len:7} ({eta})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("━━─"),
        );
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }

    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    pub fn for_terminal(quiet: bool, message: &str) -> Self {
        if quiet {
            Self::hidden()
        } else {
            Self::new(message)
        }
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }
}

impl WaitingHandler for ProgressHandler {
    fn set_max(&self, max: u64) {
        self.bar.set_length(max);
        self.bar.set_position(0);
    }

    fn increment(&self) {
        self.bar.inc(1);
    }

    fn is_canceled(&self) -> bool {
        false
    }

    fn set_message(&self, message: &str) {
        self.bar.set_message(message.to_string());
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

/// Spinner shown while a database is loaded
pub fn create_spinner(quiet: bool, message: &str) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_tracks_progress() {
        let handler = ProgressHandler::hidden();
        handler.set_max(10);
        handler.increment();
        handler.increment();
        assert_eq!(handler.position(), 2);
        assert!(!handler.is_canceled());

        handler.set_max(4);
        assert_eq!(handler.position(), 0);
        handler.finish();
    }
}
