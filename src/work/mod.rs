//! Background refresh work and the scheduler that runs it.

mod manager;
mod refresh;

pub use manager::{
  Constraints, ExistingPeriodicWorkPolicy, PeriodicWorkRequest, WorkInfo, WorkManager, WorkState,
};
pub use refresh::RefreshDataWork;

use color_eyre::Result;
use futures::future::BoxFuture;

/// Outcome reported back to the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkResult {
  Success,
  /// Transient failure; the scheduler decides when to try again
  Retry,
}

/// A unit of work the scheduler can run.
///
/// An `Err` is an unhandled fault: the scheduler logs it and waits for the
/// next period instead of retrying.
pub trait Worker: Send + Sync {
  fn do_work(&self) -> BoxFuture<'_, Result<WorkResult>>;
}
