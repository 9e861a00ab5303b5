//! Progress observer port
//!
//! Advisory progress reporting for deployment rounds. Observers receive a
//! percentage after each applied operation; reporting never affects
//! correctness and observer panics are the observer's problem.

/// Port trait for advisory progress notification
pub trait IProgressObserver: Send + Sync {
    /// Called with `processed * 100 / total` after each applied operation
    /// in the current round.
    fn progress(&self, percent: u8);
}

/// Observer that discards all notifications
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

impl IProgressObserver for NoopProgress {
    fn progress(&self, _percent: u8) {}
}
