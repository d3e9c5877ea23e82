//! Presentation Boundary
//!
//! The pipeline driver and the provider adapters report progress and phase
//! failures through [`ProgressReporter`]; the binary decides how to render
//! them. Keeping the trait here lets the provider crate report poll
//! progress without depending on any UI code.

/// Receives progress and error reports from the pipeline.
///
/// Implementations must be cheap to call: adapters invoke `progress` from
/// inside polling and per-task loops.
pub trait ProgressReporter: Send + Sync {
    /// Report phase progress on a 0-100 scale with a free-text status line.
    fn progress(&self, percent: u8, status: &str);

    /// Report a phase failure. `phase` is a short lowercase phase label.
    fn error(&self, phase: &str, message: &str);
}

/// Reporter that discards everything.
///
/// Useful for tests and non-interactive invocations.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProgress;

impl ProgressReporter for NullProgress {
    fn progress(&self, _percent: u8, _status: &str) {}

    fn error(&self, _phase: &str, _message: &str) {}
}
