//! In-process periodic work scheduler.
//!
//! Runs named workers on a fixed interval. A worker asking for a retry is run
//! again after an exponential backoff instead of waiting for the next period.

use chrono::{DateTime, Utc};
use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::{WorkResult, Worker};

/// Preconditions under which periodic work should run.
///
/// Handed to the scheduler as configuration and reported in logs; they are
/// not checked against the machine's actual network or power state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Constraints {
  pub requires_unmetered_network: bool,
  pub requires_battery_not_low: bool,
  pub requires_charging: bool,
  pub requires_device_idle: bool,
}

impl Default for Constraints {
  fn default() -> Self {
    Self {
      requires_unmetered_network: true,
      requires_battery_not_low: true,
      requires_charging: true,
      requires_device_idle: true,
    }
  }
}

/// What to do when work with the same name is already registered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExistingPeriodicWorkPolicy {
  /// Leave the existing registration running
  Keep,
  /// Cancel the existing registration and start the new one
  Replace,
}

#[derive(Debug, Clone)]
pub struct PeriodicWorkRequest {
  pub interval: Duration,
  pub constraints: Constraints,
  /// First retry delay; doubles on each consecutive retry, capped at `interval`
  pub initial_backoff: Duration,
  /// Wait before the first run
  pub initial_delay: Duration,
}

impl PeriodicWorkRequest {
  pub fn new(interval: Duration) -> Self {
    Self {
      interval,
      constraints: Constraints::default(),
      initial_backoff: Duration::from_secs(30),
      initial_delay: Duration::ZERO,
    }
  }

  pub fn with_constraints(mut self, constraints: Constraints) -> Self {
    self.constraints = constraints;
    self
  }

  pub fn with_initial_backoff(mut self, initial_backoff: Duration) -> Self {
    self.initial_backoff = initial_backoff;
    self
  }

  pub fn with_initial_delay(mut self, initial_delay: Duration) -> Self {
    self.initial_delay = initial_delay;
    self
  }
}

/// Lifecycle of a registered piece of work
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkState {
  Enqueued,
  Running,
  Succeeded,
  Retrying,
  Failed,
}

/// Snapshot of a registered piece of work.
#[derive(Debug, Clone)]
pub struct WorkInfo {
  pub state: WorkState,
  pub run_attempt: u32,
  pub last_run: Option<DateTime<Utc>>,
}

struct RegisteredWork {
  handle: JoinHandle<()>,
  info: Arc<Mutex<WorkInfo>>,
}

/// Registry of unique periodic work.
#[derive(Default)]
pub struct WorkManager {
  works: Mutex<HashMap<String, RegisteredWork>>,
}

impl WorkManager {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register `worker` under `name`.
  ///
  /// Returns `false` when `Keep` left an existing registration in place.
  /// Must be called from within a tokio runtime.
  pub fn enqueue_unique_periodic_work(
    &self,
    name: &str,
    policy: ExistingPeriodicWorkPolicy,
    request: PeriodicWorkRequest,
    worker: Arc<dyn Worker>,
  ) -> Result<bool> {
    let mut works = self
      .works
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    if let Some(existing) = works.get(name) {
      let finished = existing.handle.is_finished();
      match policy {
        ExistingPeriodicWorkPolicy::Keep if !finished => {
          info!(work = name, "Periodic work already scheduled, keeping it");
          return Ok(false);
        }
        _ => existing.handle.abort(),
      }
    }

    info!(
      work = name,
      interval_secs = request.interval.as_secs(),
      first_run_in_secs = request.initial_delay.as_secs(),
      constraints = ?request.constraints,
      "Scheduling periodic work"
    );

    let info = Arc::new(Mutex::new(WorkInfo {
      state: WorkState::Enqueued,
      run_attempt: 0,
      last_run: None,
    }));
    let handle = tokio::spawn(run_periodic(
      name.to_string(),
      request,
      worker,
      Arc::clone(&info),
    ));

    works.insert(name.to_string(), RegisteredWork { handle, info });
    Ok(true)
  }

  /// Current state of the work registered under `name`
  #[cfg(test)]
  pub fn work_info(&self, name: &str) -> Option<WorkInfo> {
    let works = self.works.lock().ok()?;
    let work = works.get(name)?;
    let info = work.info.lock().ok()?.clone();
    Some(info)
  }

  /// Cancel the work registered under `name`. Returns whether it existed.
  #[cfg(test)]
  pub fn cancel_unique_work(&self, name: &str) -> bool {
    let Ok(mut works) = self.works.lock() else {
      return false;
    };
    match works.remove(name) {
      Some(work) => {
        work.handle.abort();
        info!(work = name, "Cancelled periodic work");
        true
      }
      None => false,
    }
  }

  /// Cancel all registered work.
  pub fn shutdown(&self) {
    if let Ok(mut works) = self.works.lock() {
      for (_, work) in works.drain() {
        work.handle.abort();
      }
    }
  }
}

impl Drop for WorkManager {
  fn drop(&mut self) {
    self.shutdown();
  }
}

async fn run_periodic(
  name: String,
  request: PeriodicWorkRequest,
  worker: Arc<dyn Worker>,
  info: Arc<Mutex<WorkInfo>>,
) {
  let mut backoff = request.initial_backoff;

  if !request.initial_delay.is_zero() {
    tokio::time::sleep(request.initial_delay).await;
  }

  loop {
    let run_attempt = update_info(&info, WorkState::Running);
    let outcome = worker.do_work().await;

    let delay = match outcome {
      Ok(WorkResult::Success) => {
        info!(work = %name, "Work succeeded");
        update_info(&info, WorkState::Succeeded);
        backoff = request.initial_backoff;
        request.interval
      }
      Ok(WorkResult::Retry) => {
        let delay = backoff;
        backoff = backoff.saturating_mul(2).min(request.interval);
        warn!(work = %name, run_attempt, retry_in_secs = delay.as_secs(), "Work asked for retry");
        update_info(&info, WorkState::Retrying);
        delay
      }
      Err(e) => {
        error!(work = %name, error = ?e, "Work failed");
        update_info(&info, WorkState::Failed);
        backoff = request.initial_backoff;
        request.interval
      }
    };

    tokio::time::sleep(delay).await;
  }
}

/// Record a state change; returns the run attempt number when starting a run.
fn update_info(info: &Mutex<WorkInfo>, state: WorkState) -> u32 {
  let Ok(mut info) = info.lock() else {
    return 0;
  };

  info.state = state;
  if state == WorkState::Running {
    info.run_attempt += 1;
    info.last_run = Some(Utc::now());
  }
  info.run_attempt
}
