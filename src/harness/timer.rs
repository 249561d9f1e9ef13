//! Wall-clock phase timer.

use std::time::{Duration, Instant};

#[derive(Debug, Default)]
pub struct HighResTimer {
    running: Option<(String, Instant)>,
    phases: Vec<(String, Duration)>,
}

impl HighResTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start timing `label`. A phase still running is stopped first.
    pub fn start(&mut self, label: impl Into<String>) {
        self.stop();
        self.running = Some((label.into(), Instant::now()));
    }

    /// Stop the running phase and return its duration.
    pub fn stop(&mut self) -> Option<Duration> {
        let (label, started) = self.running.take()?;
        let elapsed = started.elapsed();
        self.phases.push((label, elapsed));
        Some(elapsed)
    }

    pub fn phases(&self) -> &[(String, Duration)] {
        &self.phases
    }

    /// Log every recorded phase at info level and forget them.
    pub fn display_and_clear(&mut self) {
        self.stop();
        for (label, d) in self.phases.drain(..) {
            log::info!("{label} took {:.3} ms", d.as_secs_f64() * 1e3);
        }
    }
}
