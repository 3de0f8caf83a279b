use std::time::Duration;

use artifetch_consts::consts;
use artifetch_fetch::{FetchOutcome, Locator};
use artifetch_scheduler::Reporter;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use parking_lot::Mutex;

const TEMPLATE: &str =
    "  {spinner:.dim} {prefix:12!} [{elapsed_precise}] [{bar:20!.bright.yellow/dim.white}] {pos:>4}/{len:4} {wide_msg:.dim}";

/// Shows a single bar counting finished artifacts, with the names of the
/// artifacts that are currently being worked on as its message.
pub struct ProgressReporter {
    pb: ProgressBar,
    running: Mutex<Vec<String>>,
    failed: Mutex<usize>,
}

impl ProgressReporter {
    pub fn new(multi_progress: MultiProgress) -> Self {
        let pb = multi_progress.add(ProgressBar::new(0));
        pb.set_style(progress_style());
        pb.set_prefix("extracting");
        Self {
            pb,
            running: Mutex::new(Vec::new()),
            failed: Mutex::new(0),
        }
    }

    /// Removes the bar once all work is done.
    pub fn finish(&self) {
        self.pb.finish_and_clear();
    }

    fn update_message(&self, running: &[String]) {
        self.pb
            .set_message(consts::LOCATOR_STYLE.apply_to(running.join(", ")).to_string());
    }
}

fn progress_style() -> ProgressStyle {
    ProgressStyle::with_template(TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("━━╾─")
}

impl Reporter for ProgressReporter {
    fn on_queued(&self, total: usize) {
        self.pb.set_length(total as u64);
        self.pb.enable_steady_tick(Duration::from_millis(100));
    }

    fn on_start(&self, locator: &Locator) {
        let mut running = self.running.lock();
        running.push(locator.display_name());
        self.update_message(&running);
    }

    fn on_finished(&self, outcome: &FetchOutcome) {
        let name = outcome.locator().display_name();
        let mut running = self.running.lock();
        if let Some(idx) = running.iter().position(|running| running == &name) {
            running.remove(idx);
        }
        self.update_message(&running);
        drop(running);

        if !outcome.is_success() {
            let mut failed = self.failed.lock();
            *failed += 1;
            self.pb.set_prefix(
                consts::FAILURE_STYLE
                    .apply_to(format!("{} failed", *failed))
                    .to_string(),
            );
        }
        self.pb.inc(1);
    }
}
