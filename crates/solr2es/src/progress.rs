//! Progress milestones for long migrations.
//!
//! A notification fires each time the cumulative count crosses a multiple of
//! the configured threshold. A page that crosses several multiples at once
//! fires a single notification for the highest one.

use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

/// Default number of documents between two notifications.
pub const DEFAULT_PROGRESS_EVERY: u64 = 10_000;

/// A crossed progress threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressMilestone {
    /// Highest threshold multiple crossed.
    pub milestone: u64,
    /// Cumulative count when the threshold was crossed.
    pub processed: u64,
    /// Total reported by the source, if known.
    pub total: Option<u64>,
}

impl ProgressMilestone {
    /// Percentage of the source total, if known and non-zero.
    #[must_use]
    pub fn percent(&self) -> Option<f64> {
        self.total
            .filter(|t| *t > 0)
            .map(|t| 100.0 * self.processed as f64 / t as f64)
    }
}

/// Tracks a cumulative count and reports threshold crossings.
pub struct ProgressTracker {
    label: &'static str,
    every: u64,
    total: Option<u64>,
    processed: u64,
    next: u64,
    bar: ProgressBar,
}

impl ProgressTracker {
    /// Creates a tracker notifying every `every` documents (0 disables it).
    pub fn new(label: &'static str, every: u64) -> Self {
        Self {
            label,
            every,
            total: None,
            processed: 0,
            next: every,
            bar: ProgressBar::hidden(),
        }
    }

    /// Mirrors the counters on a terminal progress bar.
    #[must_use]
    pub fn with_bar(mut self, show: bool) -> Self {
        if show {
            self.bar = create_progress_bar(self.total.unwrap_or(0));
        }
        self
    }

    /// Records the source total used for percentages.
    pub fn set_total(&mut self, total: Option<u64>) {
        self.total = total;
        if let Some(total) = total {
            self.bar.set_length(total);
        }
    }

    /// Current cumulative count.
    #[must_use]
    pub fn processed(&self) -> u64 {
        self.processed
    }

    /// Moves the count to `processed` and returns the milestone crossed, if any.
    pub fn update(&mut self, processed: u64) -> Option<ProgressMilestone> {
        self.processed = processed;
        self.bar.set_position(processed);

        if self.every == 0 || processed < self.next {
            return None;
        }

        let milestone = processed - processed % self.every;
        self.next = milestone + self.every;

        let event = ProgressMilestone {
            milestone,
            processed,
            total: self.total,
        };
        match (event.total, event.percent()) {
            (Some(total), Some(percent)) => info!(
                "{} {} docs of {} ({:.1} % done)",
                self.label, processed, total, percent
            ),
            _ => info!("{} {} docs", self.label, processed),
        }
        Some(event)
    }

    /// Closes the progress bar.
    pub fn finish(&self, message: &'static str) {
        self.bar.finish_with_message(message);
    }
}

fn create_progress_bar(total: u64) -> ProgressBar {
    let pb = if total > 0 {
        ProgressBar::new(total)
    } else {
        ProgressBar::new_spinner()
    };

    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );

    pb
}
