use std::fmt;

use crossbeam::channel::{self, Receiver};
use crossbeam::select;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

const STATUS_TEMPLATE: &str = "{spinner:.green} {msg}";

/// Running totals of the three progress event streams.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressTotals {
    pub queued: u64,
    pub decoded: u64,
    pub written: u64,
}

impl ProgressTotals {
    /// Every queued frame was decoded and every decoded image reached the writers.
    pub fn is_settled(&self) -> bool {
        self.queued == self.decoded && self.decoded == self.written
    }
}

impl fmt::Display for ProgressTotals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Written/Decoded/Queued: {}/{}/{}",
            self.written, self.decoded, self.queued
        )
    }
}

/// Counts queued, decoded and written events and renders them as one status line.
///
/// Runs until all three event queues are closed and drained.
pub struct ProgressTracker {
    bar: ProgressBar,
    totals: ProgressTotals,
}

impl ProgressTracker {
    pub fn new(bar: ProgressBar) -> Self {
        Self {
            bar,
            totals: ProgressTotals::default(),
        }
    }

    /// Tracker drawing a spinner-style status line on stderr.
    pub fn with_status_line() -> Self {
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template(STATUS_TEMPLATE) {
            bar.set_style(style);
        }
        Self::new(bar)
    }

    /// Tracker that counts without drawing anything.
    pub fn hidden() -> Self {
        Self::new(ProgressBar::hidden())
    }

    pub fn run(
        mut self,
        queued: Receiver<u64>,
        decoded: Receiver<u64>,
        written: Receiver<u64>,
    ) -> ProgressTotals {
        let never = channel::never::<u64>();
        let mut queued_open = true;
        let mut decoded_open = true;
        let mut written_open = true;

        self.render();
        while queued_open || decoded_open || written_open {
            select! {
                recv(if queued_open { &queued } else { &never }) -> event => match event {
                    Ok(index) => {
                        self.totals.queued += 1;
                        debug!(index, "queued");
                    }
                    Err(_) => queued_open = false,
                },
                recv(if decoded_open { &decoded } else { &never }) -> event => match event {
                    Ok(index) => {
                        self.totals.decoded += 1;
                        debug!(index, "decoded");
                    }
                    Err(_) => decoded_open = false,
                },
                recv(if written_open { &written } else { &never }) -> event => match event {
                    Ok(index) => {
                        self.totals.written += 1;
                        debug!(index, "written");
                    }
                    Err(_) => written_open = false,
                },
            }
            self.render();
        }

        self.bar.finish();
        info!(
            queued = self.totals.queued,
            decoded = self.totals.decoded,
            written = self.totals.written,
            "all progress streams closed"
        );
        self.totals
    }

    fn render(&self) {
        self.bar.set_message(self.totals.to_string());
        self.bar.tick();
    }
}
