//! Stage spinner driven by pipeline callbacks.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use oaysus_build::{Stage, StageObserver};
use owo_colors::{OwoColorize, Stream::Stderr};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use super::format::format_duration;

/// Shows one spinner line per pipeline stage and leaves a check mark behind.
///
/// ```no_run
/// use oaysus_build::{PipelineOptions, PublishPipeline};
/// use oaysus_cli::ui::StageSpinner;
/// use std::sync::Arc;
///
/// let spinner = Arc::new(StageSpinner::new());
/// let pipeline = PublishPipeline::new(PipelineOptions::new(".")).with_observer(spinner);
/// ```
pub struct StageSpinner {
    pb: ProgressBar,
    started: Mutex<Option<Instant>>,
}

impl StageSpinner {
    pub fn new() -> Self {
        let pb = if super::interactive() {
            ProgressBar::new_spinner()
        } else {
            ProgressBar::with_draw_target(None, ProgressDrawTarget::hidden())
        };
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style.tick_strings(&["◐", "◓", "◑", "◒", "✓"]));
        }
        Self {
            pb,
            started: Mutex::new(None),
        }
    }

    /// Stop drawing and clear the current line.
    pub fn finish(&self) {
        self.pb.finish_and_clear();
    }

    /// Mark the running stage as failed.
    pub fn fail(&self, stage: Stage) {
        self.pb.suspend(|| {
            eprintln!("{} {}", "✗".if_supports_color(Stderr, |t| t.red()), stage.label());
        });
        self.pb.finish_and_clear();
    }

    fn elapsed(&self) -> Option<Duration> {
        self.started
            .lock()
            .ok()
            .and_then(|started| started.map(|t| t.elapsed()))
    }
}

impl Default for StageSpinner {
    fn default() -> Self {
        Self::new()
    }
}

impl StageObserver for StageSpinner {
    fn on_stage_start(&self, stage: Stage) {
        if let Ok(mut started) = self.started.lock() {
            *started = Some(Instant::now());
        }
        self.pb.set_message(format!("{}...", stage.label()));
        self.pb.enable_steady_tick(Duration::from_millis(100));
    }

    fn on_stage_complete(&self, stage: Stage) {
        let elapsed = self
            .elapsed()
            .map(|d| format!(" ({})", format_duration(d)))
            .unwrap_or_default();
        self.pb.suspend(|| {
            eprintln!(
                "{} {}{}",
                "✓".if_supports_color(Stderr, |t| t.green()),
                stage.label(),
                elapsed.if_supports_color(Stderr, |t| t.dimmed())
            );
        });
    }

    fn on_warning(&self, _stage: Stage, message: &str) {
        self.pb.suspend(|| super::warning(message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spinner_stage_cycle() {
        let spinner = StageSpinner::new();
        spinner.on_stage_start(Stage::Validate);
        spinner.on_warning(Stage::Validate, "warning");
        spinner.on_stage_complete(Stage::Validate);
        spinner.on_stage_start(Stage::BuildClient);
        spinner.fail(Stage::BuildClient);
    }
}
