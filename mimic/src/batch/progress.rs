//! Progress notification sinks for batch runs.

use std::sync::Arc;

use parking_lot::Mutex;

/// One-way receiver of human-readable progress lines.
///
/// Lines are delivered from the thread driving the batch, in order. A sink has
/// no way to fail the batch.
pub trait Progress {
    fn report(&self, line: &str);
}

impl<F: Fn(&str)> Progress for F {
    fn report(&self, line: &str) {
        self(line)
    }
}

/// Forwards every line to `tracing::info!`. Used when no sink is given.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgress;

impl Progress for TracingProgress {
    fn report(&self, line: &str) {
        tracing::info!(target: "mimic::progress", "{line}");
    }
}

/// Collects lines in memory. Clones share the same buffer, so a UI thread can
/// drain lines while a batch runs elsewhere.
#[derive(Debug, Default, Clone)]
pub struct ProgressLog(Arc<Mutex<Vec<String>>>);

impl ProgressLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write<S: Into<String>>(&self, line: S) {
        self.0.lock().push(line.into());
    }

    /// Removes and returns everything collected so far.
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.0.lock())
    }

    pub fn lines(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.0.lock().iter().any(|line| line.contains(needle))
    }
}

impl Progress for ProgressLog {
    fn report(&self, line: &str) {
        self.write(line);
    }
}
