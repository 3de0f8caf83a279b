//! Fans a list of locators out over a bounded number of concurrent workers
//! and gathers exactly one outcome per locator.

mod limits;
mod reporter;
mod scheduler;

pub use limits::{ConcurrencyBudget, Limit};
pub use reporter::Reporter;
pub use scheduler::Scheduler;
