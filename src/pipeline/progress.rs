// file: src/pipeline/progress.rs
// description: progress tracking and statistics for batch question answering
// reference: uses indicatif for progress bars and tracks answer outcomes

use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchStats {
    /// Includes degraded answers
    pub answered: usize,
    pub degraded: usize,
    pub failed: usize,
    pub duration_secs: u64,
}

impl BatchStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total(&self) -> usize {
        self.answered + self.failed
    }

    pub fn questions_per_second(&self) -> f64 {
        if self.duration_secs == 0 {
            return 0.0;
        }
        self.total() as f64 / self.duration_secs as f64
    }

    pub fn success_rate(&self) -> f64 {
        if self.total() == 0 {
            return 0.0;
        }
        (self.answered as f64 / self.total() as f64) * 100.0
    }

    pub fn degraded_rate(&self) -> f64 {
        if self.answered == 0 {
            return 0.0;
        }
        (self.degraded as f64 / self.answered as f64) * 100.0
    }

    pub fn summary(&self) -> String {
        format!(
            "{} answered ({} degraded), {} failed in {}s",
            self.answered.to_string().green().bold(),
            self.degraded.to_string().yellow(),
            self.failed.to_string().red(),
            self.duration_secs
        )
    }
}

pub struct ProgressTracker {
    main_bar: ProgressBar,
    detail_bar: ProgressBar,
    answered: Arc<AtomicUsize>,
    degraded: Arc<AtomicUsize>,
    failed: Arc<AtomicUsize>,
    start_time: Instant,
}

impl ProgressTracker {
    pub fn new(total_questions: usize) -> Self {
        Self::with_color(total_questions, true)
    }

    pub fn with_color(total_questions: usize, colored: bool) -> Self {
        let multi_progress = MultiProgress::new();

        let main_bar = create_progress_bar(&multi_progress, total_questions as u64, colored);
        let detail_bar = create_detail_bar(&multi_progress);

        Self {
            main_bar,
            detail_bar,
            answered: Arc::new(AtomicUsize::new(0)),
            degraded: Arc::new(AtomicUsize::new(0)),
            failed: Arc::new(AtomicUsize::new(0)),
            start_time: Instant::now(),
        }
    }

    pub fn record_answered(&self, degraded: bool) {
        self.answered.fetch_add(1, Ordering::SeqCst);
        if degraded {
            self.degraded.fetch_add(1, Ordering::SeqCst);
        }
        self.main_bar.inc(1);
        self.update_detail_bar();
    }

    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::SeqCst);
        self.main_bar.inc(1);
        self.update_detail_bar();
    }

    pub fn set_message(&self, message: String) {
        self.main_bar.set_message(message);
    }

    pub fn finish(&self) {
        self.main_bar.finish_with_message("Batch complete");
        self.detail_bar.finish_and_clear();
    }

    pub fn get_stats(&self) -> BatchStats {
        BatchStats {
            answered: self.answered.load(Ordering::SeqCst),
            degraded: self.degraded.load(Ordering::SeqCst),
            failed: self.failed.load(Ordering::SeqCst),
            duration_secs: self.start_time.elapsed().as_secs(),
        }
    }

    fn update_detail_bar(&self) {
        let message = format!(
            "Answered: {} | Degraded: {} | Failed: {}",
            self.answered.load(Ordering::SeqCst),
            self.degraded.load(Ordering::SeqCst),
            self.failed.load(Ordering::SeqCst)
        );
        self.detail_bar.set_message(message);
    }
}

impl Drop for ProgressTracker {
    fn drop(&mut self) {
        self.finish();
    }
}

fn create_progress_bar(multi_progress: &MultiProgress, total: u64, colored: bool) -> ProgressBar {
    let bar = multi_progress.add(ProgressBar::new(total));
    if colored {
        bar.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
                )
                .expect("progress bar template is valid")
                .progress_chars("█▓▒░"),
        );
    } else {
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({eta}) {msg}")
                .expect("progress bar template is valid")
                .progress_chars("=>-"),
        );
    }
    bar
}

fn create_detail_bar(multi_progress: &MultiProgress) -> ProgressBar {
    let bar = multi_progress.add(ProgressBar::new(0));
    let style = ProgressStyle::default_bar()
        .template("{msg}")
        .expect("detail bar template is valid");
    bar.set_style(style);
    bar
}
