//! Terminal progress display.

use indicatif::{ProgressBar, ProgressStyle};

use vcomp_media::ProgressEvent;
use vcomp_models::{format_hms, JobOutcome};

const PROGRESS_BAR_TEMPLATE: &str =
    "{prefix:.bold} [{bar:40.cyan/blue}] {percent:>3}% remaining {msg}";
const PROGRESS_BAR_CHARS: &str = "=>-";
/// Bar resolution; fractions are mapped onto this many steps.
const BAR_STEPS: u64 = 1000;

/// Renders batch progress events as a single terminal progress bar.
pub struct ConsoleProgress {
    bar: ProgressBar,
    current: Option<String>,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        Self::with_bar(ProgressBar::new(BAR_STEPS))
    }

    /// Progress display that draws nothing.
    pub fn hidden() -> Self {
        Self::with_bar(ProgressBar::hidden())
    }

    fn with_bar(bar: ProgressBar) -> Self {
        bar.set_length(BAR_STEPS);
        if let Ok(style) = ProgressStyle::with_template(PROGRESS_BAR_TEMPLATE) {
            bar.set_style(style.progress_chars(PROGRESS_BAR_CHARS));
        }
        Self { bar, current: None }
    }

    /// Apply one event to the display.
    pub fn handle(&mut self, event: &ProgressEvent) {
        match event {
            ProgressEvent::Progress { fraction } => {
                self.bar.set_position(to_steps(*fraction));
            }
            ProgressEvent::RemainingTime { seconds } => {
                self.bar.set_message(format_hms(*seconds));
            }
            ProgressEvent::CurrentFile { name } => {
                if self.current.as_deref() != Some(name.as_str()) {
                    self.bar.set_prefix(name.clone());
                    self.current = Some(name.clone());
                }
            }
            ProgressEvent::JobFinished { name, outcome } => {
                let line = match outcome {
                    JobOutcome::Completed => format!("done      {}", name),
                    JobOutcome::Skipped => format!("skipped   {}", name),
                    JobOutcome::Cancelled => format!("cancelled {}", name),
                    JobOutcome::Failed { error } => format!("failed    {}: {}", name, error),
                };
                self.bar.println(line);
                self.bar.reset();
                self.bar.set_message("");
                self.bar.set_prefix("");
                self.current = None;
            }
        }
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    pub fn current_file(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

fn to_steps(fraction: f64) -> u64 {
    (fraction.clamp(0.0, 1.0) * BAR_STEPS as f64).round() as u64
}
