//! Percentage progress and timing markers emitted through `log`.

use std::time::Instant;

/// Steps through a known number of items and logs percentages at debug level.
#[derive(Debug)]
pub struct Progress {
    job: &'static str,
    total: usize,
    done: usize,
    enabled: bool,
}

impl Progress {
    pub fn new(job: &'static str, total: usize, enabled: bool) -> Self {
        if enabled {
            log::debug!("{job}: starting ({total} items)");
        }
        Self {
            job,
            total,
            done: 0,
            enabled,
        }
    }

    pub fn percent(&self) -> u32 {
        if self.total == 0 {
            100
        } else {
            (self.done * 100 / self.total) as u32
        }
    }

    pub fn step(&mut self) {
        self.done = (self.done + 1).min(self.total);
        if self.enabled {
            log::debug!("{}: progress is {:02}% done", self.job, self.percent());
        }
    }

    pub fn finish(&mut self) {
        self.done = self.total;
        if self.enabled {
            log::debug!("{}: finished", self.job);
        }
    }
}

/// Elapsed-time markers, active only when the config asks for timing.
#[derive(Debug)]
pub struct Timer {
    start: Instant,
    enabled: bool,
}

impl Timer {
    pub fn new(enabled: bool) -> Self {
        Self {
            start: Instant::now(),
            enabled,
        }
    }

    pub fn mark(&self, note: &str) {
        if self.enabled {
            log::debug!(
                "{:<30}{:.3} ms",
                note,
                self.start.elapsed().as_secs_f64() * 1000.0
            );
        }
    }
}
