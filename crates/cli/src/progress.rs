//! Terminal progress: capture countdown bar and cracking spinner

use indicatif::{ProgressBar, ProgressStyle};
use parking_lot::Mutex;
use std::time::Duration;

use airhook_common::{AccessPoint, CaptureState};
use airhook_engine::CaptureObserver;

#[derive(Default)]
pub struct TerminalProgress {
    bar: Mutex<Option<ProgressBar>>,
}

impl TerminalProgress {
    pub fn new() -> Self {
        Self::default()
    }

    fn clear(&self) {
        if let Some(pb) = self.bar.lock().take() {
            pb.finish_and_clear();
        }
    }
}

/// Spinner for a blocking operation without a known end.
pub fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg} [{elapsed_precise}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

impl CaptureObserver for TerminalProgress {
    fn on_state(&self, _target: &AccessPoint, state: CaptureState) {
        if state.is_trigger() {
            self.clear();
        }
    }

    fn on_tick(&self, target: &AccessPoint, elapsed: Duration, remaining: Duration) {
        let mut bar = self.bar.lock();
        let pb = bar.get_or_insert_with(|| {
            let pb = ProgressBar::new((elapsed + remaining).as_secs().max(1));
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{msg} [{bar:40.cyan/blue}] {pos}/{len}s")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("=>-"),
            );
            pb.set_message(format!("Capturing handshake for {}", target.display_name()));
            pb
        });
        pb.set_position(elapsed.as_secs());
    }

    fn on_cracking(&self, target: &AccessPoint, running: bool) {
        let mut bar = self.bar.lock();
        if running {
            *bar = Some(spinner(format!("Cracking {}", target.display_name())));
        } else if let Some(pb) = bar.take() {
            pb.finish_and_clear();
        }
    }
}
