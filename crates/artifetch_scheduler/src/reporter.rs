use artifetch_fetch::{FetchOutcome, Locator};

/// Receives progress notifications from the [`crate::Scheduler`].
///
/// Methods may be called concurrently from different worker tasks.
pub trait Reporter: Send + Sync {
    /// Called once before any work starts with the number of locators.
    fn on_queued(&self, total: usize);

    /// Called when a worker picks up `locator`.
    fn on_start(&self, locator: &Locator);

    /// Called once for every outcome, including cancelled ones. A worker
    /// that ran to completion reports before it gives up its slot.
    fn on_finished(&self, outcome: &FetchOutcome);
}
